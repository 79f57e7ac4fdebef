use std::fmt;

/// The four AFS containers a chants table record can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchiveKind {
    NeutralSound,
    NeutralText,
    LocalizedSound,
    LocalizedText,
}

impl ArchiveKind {
    pub const ALL: [ArchiveKind; 4] = [
        ArchiveKind::NeutralSound,
        ArchiveKind::NeutralText,
        ArchiveKind::LocalizedSound,
        ArchiveKind::LocalizedText,
    ];

    pub fn from_selector(selector: u16) -> Option<ArchiveKind> {
        ArchiveKind::ALL.get(usize::from(selector)).copied()
    }

    pub fn selector(self) -> u16 {
        match self {
            ArchiveKind::NeutralSound => 0,
            ArchiveKind::NeutralText => 1,
            ArchiveKind::LocalizedSound => 2,
            ArchiveKind::LocalizedText => 3,
        }
    }

    /// Container file name, e.g. `0_sound.afs` or `e_text.afs` for language `e`.
    pub fn file_name(self, language: &str) -> String {
        match self {
            ArchiveKind::NeutralSound => "0_sound.afs".to_owned(),
            ArchiveKind::NeutralText => "0_text.afs".to_owned(),
            ArchiveKind::LocalizedSound => format!("{}_sound.afs", language),
            ArchiveKind::LocalizedText => format!("{}_text.afs", language),
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveKind::NeutralSound => "neutral sound",
            ArchiveKind::NeutralText => "neutral text",
            ArchiveKind::LocalizedSound => "localized sound",
            ArchiveKind::LocalizedText => "localized text",
        };
        f.write_str(name)
    }
}
