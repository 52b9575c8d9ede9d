use crate::aggregator::ConfidencePolicy;
use crate::cli::Args;
use crate::pipeline::{PipelineSettings, DEFAULT_RECOGNITION_LANGUAGES};
use crate::recognition::DEFAULT_MIN_CONFIDENCE;
use crate::segmentation::{RegionOrder, SegmenterConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Preferred text recognition engine; first compiled one when unset
    pub engine: Option<String>,
    /// Recognition languages (ISO 639-1)
    pub languages: Vec<String>,
    pub analysis_language: String,
    pub max_file_size: usize,
    pub min_fragment_confidence: f32,
    pub min_region_width: u32,
    pub min_region_height: u32,
    pub region_order: RegionOrder,
    /// Entities scoring below this are left out of records
    pub score_threshold: f32,
    pub image_timeout_secs: u64,
    pub max_concurrent_images: usize,
    pub report_dir: PathBuf,
    /// Extra TOML pattern recognizers
    pub patterns_file: Option<PathBuf>,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            engine: None,
            languages: DEFAULT_RECOGNITION_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect(),
            analysis_language: "en".to_string(),
            max_file_size: 52_428_800,
            min_fragment_confidence: DEFAULT_MIN_CONFIDENCE,
            min_region_width: 50,
            min_region_height: 20,
            region_order: RegionOrder::Discovery,
            score_threshold: 0.0,
            image_timeout_secs: 120,
            max_concurrent_images: 1,
            report_dir: PathBuf::from("."),
            patterns_file: None,
            tessdata_path: None,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            engine: args.engine,
            languages: args.languages,
            analysis_language: args.analysis_language,
            max_file_size: args.max_file_size,
            min_fragment_confidence: args.min_fragment_confidence,
            min_region_width: args.min_region_width,
            min_region_height: args.min_region_height,
            region_order: args.region_order,
            score_threshold: args.score_threshold,
            image_timeout_secs: args.image_timeout,
            max_concurrent_images: args.max_concurrent_images,
            report_dir: args.report_dir,
            patterns_file: args.patterns_file,
            tessdata_path: args.tessdata_path,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            languages: config.languages.clone(),
            analysis_language: config.analysis_language.clone(),
            min_fragment_confidence: config.min_fragment_confidence,
            policy: ConfidencePolicy::new(config.score_threshold),
            segmenter: SegmenterConfig {
                min_width: config.min_region_width,
                min_height: config.min_region_height,
                order: config.region_order,
                ..SegmenterConfig::default()
            },
            image_timeout: Duration::from_secs(config.image_timeout_secs),
            max_concurrent_images: config.max_concurrent_images.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_defaults_match_config_defaults() {
        let from_cli = Config::from(Args::parse_from(["pii-discovery"]));
        let defaults = Config::default();

        assert_eq!(from_cli.host, defaults.host);
        assert_eq!(from_cli.port, defaults.port);
        assert_eq!(from_cli.languages, defaults.languages);
        assert_eq!(from_cli.max_file_size, defaults.max_file_size);
        assert_eq!(from_cli.min_region_width, defaults.min_region_width);
        assert_eq!(from_cli.region_order, defaults.region_order);
        assert_eq!(from_cli.score_threshold, defaults.score_threshold);
        assert_eq!(from_cli.image_timeout_secs, defaults.image_timeout_secs);
        assert_eq!(from_cli.report_dir, defaults.report_dir);
    }

    #[test]
    fn test_default_languages_are_english_and_spanish() {
        let from_cli = Config::from(Args::parse_from(["pii-discovery"]));
        assert_eq!(from_cli.languages, vec!["en", "es"]);
        assert_eq!(PipelineSettings::default().languages, vec!["en", "es"]);
        assert_eq!(PipelineSettings::from(&from_cli).languages, vec!["en", "es"]);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            score_threshold: 0.1,
            region_order: RegionOrder::Reading,
            max_concurrent_images: 0,
            ..Config::default()
        };
        let settings = PipelineSettings::from(&config);

        assert_eq!(settings.policy.min_score, 0.1);
        assert_eq!(settings.segmenter.order, RegionOrder::Reading);
        assert_eq!(settings.segmenter.block_size, 11);
        assert_eq!(settings.max_concurrent_images, 1);
        assert_eq!(settings.image_timeout, Duration::from_secs(120));
    }
}
