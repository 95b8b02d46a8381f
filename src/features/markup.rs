//! 插入页面的元素片段

use crate::dom::Fragment;

use super::translator::TranslatorService;

/// 翻译图标（Font Awesome `language`）
const TRANSLATE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 640 512" width="30"><path fill="currentColor" d="M0 128C0 92.7 28.7 64 64 64l192 0 48 0 16 0 256 0c35.3 0 64 28.7 64 64l0 256c0 35.3-28.7 64-64 64l-256 0-16 0-48 0L64 448c-35.3 0-64-28.7-64-64L0 128zm320 0l0 256 256 0 0-256-256 0zM178.3 175.9c-3.2-7.2-10.4-11.9-18.3-11.9s-15.1 4.7-18.3 11.9l-64 144c-4.5 10.1 .1 21.9 10.2 26.4s21.9-.1 26.4-10.2l8.9-20.1 73.6 0 8.9 20.1c4.5 10.1 16.3 14.6 26.4 10.2s14.6-16.3 10.2-26.4l-64-144zM160 233.2L179 276l-38 0 19-42.8zM448 164c11 0 20 9 20 20l0 4 44 0 16 0c11 0 20 9 20 20s-9 20-20 20l-2 0-1.6 4.5c-8.9 24.4-22.4 46.6-39.6 65.4c.9 .6 1.8 1.1 2.7 1.6l18.9 11.3c9.5 5.7 12.5 18 6.9 27.4s-18 12.5-27.4 6.9l-18.9-11.3c-4.5-2.7-8.8-5.5-13.1-8.5c-10.6 7.5-21.9 14-34 19.4l-3.6 1.6c-10.1 4.5-21.9-.1-26.4-10.2s.1-21.9 10.2-26.4l3.6-1.6c6.4-2.9 12.6-6.1 18.5-9.8l-12.2-12.2c-7.8-7.8-7.8-20.5 0-28.3s20.5-7.8 28.3 0l14.6 14.6 .5 .5c12.4-13.1 22.5-28.3 29.8-45L448 228l-72 0c-11 0-20-9-20-20s9-20 20-20l52 0 0-4c0-11 9-20 20-20z"/></svg>"#;

/// Google 图标
const GOOGLE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 488 512" width="8"><path fill="currentColor" d="M488 261.8C488 403.3 391.1 504 248 504 110.8 504 0 393.2 0 256S110.8 8 248 8c66.8 0 123 24.5 166.3 64.9l-67.5 64.9C258.5 52.6 94.3 116.6 94.3 256c0 86.5 69.1 156.6 153.7 156.6 98.2 0 135-70.4 140.8-106.9H248v-85.3h236.1c2.3 12.7 3.9 24.9 3.9 41.4z"/></svg>"#;

/// Microsoft 图标
const MICROSOFT_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 448 512" width="8"><path fill="currentColor" d="M0 32h214.6v214.6H0V32zm233.4 0H448v214.6H233.4V32zM0 265.4h214.6V480H0V265.4zm233.4 0H448V480H233.4V265.4z"/></svg>"#;

pub const TRANSLATE_LINK_WRAP_CLASS: &str = "translate-link-wrap";
pub const TRANSLATE_LINK_CLASS: &str = "translate-link";
pub const NEW_ELEM_WRAP_CLASS: &str = "translate-links-new-elem-wrap";
pub const WRITING_EXERCISE_CLASS: &str = "writing-exercise";
pub const WRITING_INPUT_CLASS: &str = "eingabezeile1";
pub const WRITING_BUTTON_CLASS: &str = "eingabezeile2";

fn service_icon(service: TranslatorService) -> &'static str {
    match service {
        TranslatorService::Google => GOOGLE_ICON,
        TranslatorService::Microsoft => MICROSOFT_ICON,
    }
}

/// 一组翻译链接（Google + Bing）
///
/// # 参数
/// - `placement_class`: 区分放置位置的 class
/// - `source` / `target`: 语言代码
/// - `text`: 要翻译的文本；为空时链接不带 `href`
pub fn translate_links(placement_class: &str, source: &str, target: &str, text: Option<&str>) -> Fragment {
    TranslatorService::ALL
        .into_iter()
        .fold(Fragment::new("div").class(TRANSLATE_LINK_WRAP_CLASS), |wrap, service| {
            let mut link = Fragment::new("a")
                .class(TRANSLATE_LINK_CLASS)
                .class(service.link_class())
                .class(placement_class)
                .attr("target", "_blank")
                .icon(service_icon(service))
                .icon(TRANSLATE_ICON);
            if let Some(href) = link_href(service, source, target, text) {
                link = link.attr("href", href);
            }
            wrap.child(link)
        })
}

/// 链接的 `href`；文本为空时没有
pub fn link_href(service: TranslatorService, source: &str, target: &str, text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| service.url(source, target, t))
}

/// 表格后面用来放整段翻译链接的容器
pub fn new_elem_wrap() -> Fragment {
    Fragment::new("div").class(NEW_ELEM_WRAP_CLASS)
}

/// 听写练习：输入框 + "Test" 按钮
///
/// `cta_href` 取自页面上显示答案的灯泡按钮，点击后同样会显示答案。
pub fn writing_exercise(cta_href: Option<String>) -> Fragment {
    let input = Fragment::new("input")
        .class(WRITING_INPUT_CLASS)
        .attr("type", "text")
        .attr("autocapitalize", "off")
        .attr("autocomplete", "off");
    let mut button = Fragment::new("a")
        .class("ctabutton")
        .class("ctaklein2")
        .class(WRITING_BUTTON_CLASS)
        .text("Test");
    if let Some(href) = cta_href {
        button = button.attr("href", href);
    }
    Fragment::new("div")
        .class(WRITING_EXERCISE_CLASS)
        .child(input)
        .child(button)
}
