use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Build intent validation ──
    #[error("name cannot be empty, please set it as the first argument")]
    EmptyName,

    #[error("--git-url and --file cannot be set together")]
    ConflictingSource,

    #[error("no source given — use --git-url for a git repository or --file for inline code")]
    MissingSource,

    #[error("{flag} cannot be empty, please use --{flag} to set")]
    MissingFlag { flag: &'static str },
}
