use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub base_url: String,
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    //email
    pub from_email: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    //ai
    pub ai_endpoint: String,
    pub ai_provider: String,
    pub ai_model: String,
    pub ai_key: String,
    #[serde(default = "default_ai_max_tokens")]
    pub ai_max_tokens: u32,
    pub ai_temperature: Option<f32>,
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,
    //object storage
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket_name: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    //extraction service
    pub extractor_endpoint: String,
    #[serde(default = "default_extractor_mode")]
    pub extractor_mode: String,
    #[serde(default)]
    pub extractor_need_personal_data: bool,
    #[serde(default = "default_extractor_timeout_secs")]
    pub extractor_timeout_secs: u64,
    #[serde(default = "default_extract_min_chars")]
    pub extract_min_chars: usize,
    //rubric
    #[serde(default = "default_rubric_version")]
    pub rubric_version: u8,
    #[serde(default = "default_strict_criteria")]
    pub strict_criteria: bool,
}

fn default_ai_max_tokens() -> u32 {
    1500
}

fn default_ai_timeout_secs() -> u64 {
    120
}

fn default_signed_url_ttl_secs() -> u64 {
    // tightened from the earlier 3600
    1800
}

fn default_extractor_mode() -> String {
    // raw_text keeps exact characters, accents included, for spelling analysis
    "raw_text".into()
}

fn default_extractor_timeout_secs() -> u64 {
    60
}

fn default_extract_min_chars() -> usize {
    100
}

fn default_rubric_version() -> u8 {
    12
}

fn default_strict_criteria() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default())
            .build()?;
        let mut s: Settings = conf.try_deserialize()?;
        match s.ai_provider.as_str() {
            "ollama" => {
                s.ai_key = "ollama".into();
                s.ai_endpoint = "http://localhost:11434/v1".into();
                if s.ai_model.is_empty() {
                    s.ai_model = "gemma3:12b".into();
                }
            }
            "openai" => {
                s.ai_endpoint = "https://api.openai.com/v1".into();
                if s.ai_model.is_empty() {
                    s.ai_model = "gpt-4o-mini".into();
                }
            }
            "gemini" => {
                s.ai_endpoint = "https://generativelanguage.googleapis.com/v1beta/openai".into();
                if s.ai_model.is_empty() {
                    s.ai_model = "gemini-2.5-flash".into();
                }
            }
            _ => {}
        }
        Ok(s)
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
