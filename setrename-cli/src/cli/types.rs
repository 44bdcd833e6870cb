use clap::ValueEnum;
use setrename_core::MatchMode;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for setrename_core::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum MatchModeArg {
    /// Match files across folders by the "(<digits>)" ID before the extension
    Identifier,
    /// Rename the selected paths themselves
    Direct,
}

impl From<MatchModeArg> for MatchMode {
    fn from(arg: MatchModeArg) -> Self {
        match arg {
            MatchModeArg::Identifier => Self::Identifier,
            MatchModeArg::Direct => Self::Direct,
        }
    }
}
