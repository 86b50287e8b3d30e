pub mod caption;
pub mod error;
pub mod paths;

pub use caption::{
    to_lrc, to_srt, CaptionFormat, CaptionLines, LrcCaption, RawLyricLine, SrtCaption,
};
pub use error::{LyriqError, Result};
pub use paths::{config_dir, token_cache_path, CONFIG_DIR_NAME, TOKEN_CACHE_FILE_NAME};
