use std::io::{self, Write};

pub const MANIFEST_FILE_NAME: &str = "map.txt";

pub const MANIFEST_HEADER: &str = "\
# Made by PES5 Indie!
# This config maps team number into folder name
# Format: <team-num>,\"<folder name>\"
# Example: 21,\"Russia\"
# Note, if you put a # at the start of the line
# It means to be disable, just like any other kitserver module
# Always leave a blank line at the end
";

/// Writes the team -> folder mapping consumed by kitserver's chants module.
pub struct ManifestWriter<W: Write> {
    out: W,
    lines: usize,
}

impl<W: Write> ManifestWriter<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        out.write_all(MANIFEST_HEADER.as_bytes())?;
        Ok(ManifestWriter { out, lines: 0 })
    }

    pub fn write_team(&mut self, team_id: u16, folder_team_id: u16) -> io::Result<()> {
        writeln!(self.out, "{},\"{}\"", team_id, folder_team_id)?;
        self.lines += 1;
        Ok(())
    }

    /// Number of team lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_then_lines() {
        let mut writer = ManifestWriter::new(Vec::new()).unwrap();
        writer.write_team(0, 0).unwrap();
        writer.write_team(5, 0).unwrap();
        assert_eq!(writer.lines(), 2);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        insta::assert_snapshot!(text.trim_end(), @r#"
        # Made by PES5 Indie!
        # This config maps team number into folder name
        # Format: <team-num>,"<folder name>"
        # Example: 21,"Russia"
        # Note, if you put a # at the start of the line
        # It means to be disable, just like any other kitserver module
        # Always leave a blank line at the end
        0,"0"
        5,"0"
        "#);
    }
}
