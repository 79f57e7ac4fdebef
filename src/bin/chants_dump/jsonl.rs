use afs_chants::OutputEvent;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutputLine {
    Extracted {
        team_id: u16,
        slot: u32,
        output_path: String,
        size: usize,
    },
    Copied {
        team_id: u16,
        slot: u16,
        source: String,
        output_path: String,
    },
    Missing {
        team_id: u16,
        slot: u32,
        archive: String,
    },
}

impl From<&OutputEvent> for OutputLine {
    fn from(event: &OutputEvent) -> Self {
        match event {
            OutputEvent::Extracted {
                team_id,
                slot,
                path,
                size,
            } => OutputLine::Extracted {
                team_id: *team_id,
                slot: *slot,
                output_path: path.to_string_lossy().into_owned(),
                size: *size,
            },
            OutputEvent::Copied {
                team_id,
                slot,
                source,
                path,
            } => OutputLine::Copied {
                team_id: *team_id,
                slot: *slot,
                source: source.to_string_lossy().into_owned(),
                output_path: path.to_string_lossy().into_owned(),
            },
            OutputEvent::Missing {
                team_id,
                slot,
                archive,
            } => OutputLine::Missing {
                team_id: *team_id,
                slot: *slot,
                archive: archive.to_string(),
            },
        }
    }
}

pub fn write_event(out: &mut impl Write, event: &OutputEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *out, &OutputLine::from(event))?;
    writeln!(out)
}
