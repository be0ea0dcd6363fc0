use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "notes-digitizer")]
#[command(about = "Turns photos of handwritten notes into text")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Default language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Recognition engines to try, in order (e.g., "ocrs,leptess")
    #[arg(long, env = "OCR_ENGINES", value_delimiter = ',')]
    pub engines: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub max_file_size: usize,
    pub tessdata_path: Option<String>,
    /// Fallback order; empty means every compiled engine
    pub engines: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            default_language: "eng".to_string(),
            max_file_size: 50 * 1024 * 1024,
            tessdata_path: None,
            engines: Vec::new(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            default_language: args.default_language,
            max_file_size: args.max_file_size,
            tessdata_path: args.tessdata_path,
            engines: args
                .engines
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_list_is_ordered_and_normalized() {
        let args = Args::try_parse_from([
            "notes-digitizer",
            "--engines",
            "Leptess, ocrs,",
            "--port",
            "8080",
        ])
        .unwrap();

        let config = Config::from(args);
        assert_eq!(config.engines, ["leptess", "ocrs"]);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_defaults_match_args_defaults() {
        let args = Args::try_parse_from(["notes-digitizer"]).unwrap();
        let config = Config::from(args);
        let default = Config::default();

        assert_eq!(config.host, default.host);
        assert_eq!(config.max_file_size, default.max_file_size);
        assert_eq!(config.default_language, default.default_language);
    }
}
