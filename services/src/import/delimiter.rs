//! Field delimiters selectable on the import and export forms.

/// Delimiter between fields of a line.
///
/// The forms send a numeric code: `1` comma, `2` semicolon, `3` colon and,
/// for export only, `4` tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Colon,
    Tab,
}

impl Delimiter {
    /// Resolves a form code, including the export-only tab.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Comma),
            2 => Some(Self::Semicolon),
            3 => Some(Self::Colon),
            4 => Some(Self::Tab),
            _ => None,
        }
    }

    /// Resolves a code offered by the import form (1 to 3).
    pub const fn from_import_code(code: u8) -> Option<Self> {
        match Self::from_code(code) {
            Some(Self::Tab) | None => None,
            delimiter => delimiter,
        }
    }

    /// Whether the import form offers this delimiter.
    pub const fn is_importable(self) -> bool {
        !matches!(self, Self::Tab)
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Comma => 1,
            Self::Semicolon => 2,
            Self::Colon => 3,
            Self::Tab => 4,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Colon => ':',
            Self::Tab => '\t',
        }
    }

    pub const fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_codes() {
        assert_eq!(Delimiter::from_import_code(1), Some(Delimiter::Comma));
        assert_eq!(Delimiter::from_import_code(2), Some(Delimiter::Semicolon));
        assert_eq!(Delimiter::from_import_code(3), Some(Delimiter::Colon));
        assert_eq!(Delimiter::from_import_code(4), None);
        assert_eq!(Delimiter::from_import_code(0), None);
        assert!(Delimiter::Colon.is_importable());
        assert!(!Delimiter::Tab.is_importable());
    }

    #[test]
    fn test_export_codes() {
        assert_eq!(Delimiter::from_code(4), Some(Delimiter::Tab));
        assert_eq!(Delimiter::Tab.as_byte(), b'\t');
        assert_eq!(Delimiter::from_code(9), None);
        assert_eq!(Delimiter::Colon.code(), 3);
    }
}
