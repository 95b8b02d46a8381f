use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动浏览器（否则连接已在调试端口上运行的浏览器）
    pub launch_browser: bool,
    /// 自行启动时使用的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 目标URL
    pub target_url: String,
    /// 优先接管标题包含该文本的已打开页面
    pub target_title: Option<String>,
    /// 翻译链接的目标语言
    pub target_language: String,
    /// 等待页面两帧渲染的最长时间（毫秒）
    pub settle_timeout_ms: u64,
    /// 自定义结束页清理规则文件（TOML）
    pub end_screen_rules_file: Option<String>,
    /// 各功能开关
    pub features: FeatureToggles,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

/// 功能开关
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// 翻译链接
    pub translate_links: bool,
    /// 单词训练中的书写练习
    pub writing_exercise: bool,
    /// 每日训练结束页清理
    pub end_screen_cleanup: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            translate_links: true,
            writing_exercise: true,
            end_screen_cleanup: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_browser: false,
            chrome_executable: None,
            target_url: "https://www.sprachenlernen24-onlinekurs.de/".to_string(),
            target_title: None,
            target_language: "de".to_string(),
            settle_timeout_ms: 1000,
            end_screen_rules_file: None,
            features: FeatureToggles::default(),
            verbose_logging: false,
            output_log_file: "augment.log".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            launch_browser: std::env::var("LAUNCH_BROWSER").ok().and_then(|v| v.parse().ok()).unwrap_or(default.launch_browser),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            target_title: std::env::var("TARGET_TITLE").ok().or(default.target_title),
            target_language: std::env::var("TARGET_LANGUAGE").unwrap_or(default.target_language),
            settle_timeout_ms: std::env::var("SETTLE_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_timeout_ms),
            end_screen_rules_file: std::env::var("END_SCREEN_RULES_FILE").ok().or(default.end_screen_rules_file),
            features: FeatureToggles {
                translate_links: std::env::var("FEATURE_TRANSLATE_LINKS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.features.translate_links),
                writing_exercise: std::env::var("FEATURE_WRITING_EXERCISE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.features.writing_exercise),
                end_screen_cleanup: std::env::var("FEATURE_END_SCREEN_CLEANUP").ok().and_then(|v| v.parse().ok()).unwrap_or(default.features.end_screen_cleanup),
            },
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            AppError::Config(ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })
        })?;
        Self::from_toml_str(&content)
            .map_err(|source| AppError::toml_parse_failed(path.display().to_string(), source))
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 页面稳定等待超时
    pub fn settle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            browser_debug_port = 2001
            target_language = "en"

            [features]
            end_screen_cleanup = false
            "#,
        )
        .unwrap();

        assert_eq!(config.browser_debug_port, 2001);
        assert_eq!(config.target_language, "en");
        assert!(config.features.translate_links);
        assert!(!config.features.end_screen_cleanup);
        assert_eq!(config.settle_timeout_ms, 1000);
    }
}
