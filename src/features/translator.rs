//! 外部翻译服务链接

use phf::phf_map;
use reqwest::Url;

use crate::dom::PageLocation;

/// 课程名（URL 中的写法）→ 语言代码
static COURSE_LANGUAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "daenisch" => "da",
    "japanisch" => "jp",
    "schwedisch" => "sv",
};

/// 课程名在 URL 中的查找顺序
const COURSE_ORDER: [&str; 3] = ["daenisch", "japanisch", "schwedisch"];

/// 无法识别时交给翻译服务自动检测
pub const AUTO_DETECT: &str = "auto";

/// 从页面地址识别正在学习的语言
///
/// 登录区的课程写在查询串里，双语故事写在路径里，所以先查查询串再查完整地址。
pub fn detect_source_language(location: &PageLocation) -> &'static str {
    [&location.search, &location.href]
        .into_iter()
        .find_map(|text| find_course_language(&text.to_lowercase()))
        .unwrap_or(AUTO_DETECT)
}

fn find_course_language(text: &str) -> Option<&'static str> {
    COURSE_ORDER
        .iter()
        .filter_map(|course| text.find(course).map(|position| (position, *course)))
        .min_by_key(|(position, _)| *position)
        .and_then(|(_, course)| COURSE_LANGUAGES.get(course).copied())
}

/// 翻译服务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorService {
    Google,
    Microsoft,
}

impl TranslatorService {
    pub const ALL: [TranslatorService; 2] = [TranslatorService::Google, TranslatorService::Microsoft];

    /// 链接上区分服务用的 class
    pub fn link_class(self) -> &'static str {
        match self {
            TranslatorService::Google => "google-translate",
            TranslatorService::Microsoft => "microsoft-translate",
        }
    }

    /// 构建翻译链接
    ///
    /// # 参数
    /// - `source`: 源语言代码
    /// - `target`: 目标语言代码
    /// - `text`: 待翻译文本
    pub fn url(self, source: &str, target: &str, text: &str) -> String {
        let url = match self {
            TranslatorService::Google => Url::parse_with_params(
                "https://translate.google.com/",
                &[("sl", source), ("tl", target), ("op", "translate"), ("text", text)],
            ),
            TranslatorService::Microsoft => Url::parse_with_params(
                "https://www.bing.com/translator",
                &[("from", source), ("to", target), ("text", text)],
            ),
        };
        // 基础地址是常量，只有参数会变化
        url.map(String::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_query_string() {
        let location = PageLocation::from_href(
            "https://www.sprachenlernen24-onlinekurs.de/login/?kurs=Daenisch",
        );
        assert_eq!(detect_source_language(&location), "da");
    }

    #[test]
    fn test_detect_from_path() {
        let location = PageLocation::from_href(
            "https://www.sprachenlernen24.de/zweisprachige-geschichten/schwedisch/",
        );
        assert_eq!(detect_source_language(&location), "sv");
    }

    #[test]
    fn test_detect_falls_back_to_auto() {
        let location = PageLocation::from_href("https://www.sprachenlernen24.de/");
        assert_eq!(detect_source_language(&location), AUTO_DETECT);
    }

    #[test]
    fn test_google_url_encodes_text() {
        let url = TranslatorService::Google.url("da", "de", "Hvad hedder du?");
        assert_eq!(
            url,
            "https://translate.google.com/?sl=da&tl=de&op=translate&text=Hvad+hedder+du%3F"
        );
    }

    #[test]
    fn test_bing_url() {
        let url = TranslatorService::Microsoft.url("sv", "de", "tack");
        assert_eq!(url, "https://www.bing.com/translator?from=sv&to=de&text=tack");
    }
}
