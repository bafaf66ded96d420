//! Delimiter and header detection

/// Field delimiter of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Tab => '\t',
        }
    }

    /// Pick the most frequent candidate in `line`.
    ///
    /// Comma wins ties and lines with no candidate at all.
    pub fn detect(line: &str) -> Self {
        let count = |d: Delimiter| line.matches(d.as_char()).count();
        let commas = count(Self::Comma);
        let semicolons = count(Self::Semicolon);
        let tabs = count(Self::Tab);

        if semicolons > commas && semicolons > tabs {
            Self::Semicolon
        } else if tabs > commas && tabs > semicolons {
            Self::Tab
        } else {
            Self::Comma
        }
    }
}

/// Where the address and amount live in each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub address: usize,
    pub amount: usize,
    /// The first row named the columns and carries no data
    pub has_header: bool,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            address: 0,
            amount: 1,
            has_header: false,
        }
    }
}

impl ColumnLayout {
    /// Inspect the first row's cleaned fields.
    ///
    /// A header needs one field exactly `address` and one field containing
    /// `amount` (case-insensitive). Anything else means positional columns.
    pub fn detect(first_row: &[String]) -> Self {
        let lowered: Vec<String> = first_row.iter().map(|f| f.to_lowercase()).collect();
        let address = lowered.iter().position(|f| f == "address");
        let amount = lowered.iter().position(|f| f.contains("amount"));

        match (address, amount) {
            (Some(address), Some(amount)) => Self {
                address,
                amount,
                has_header: true,
            },
            _ => Self::default(),
        }
    }

    /// Minimum number of fields a data row must have.
    pub fn min_fields(&self) -> usize {
        self.address.max(self.amount) + 1
    }
}
