//! 进程内 DOM
//!
//! 简单选择器（`.class`、`#id`、`tag`）按结构匹配；其他选择器只返回通过 `bind` 登记过的元素。
//! 只有在监听状态下的修改才会产生 `HostEvent::Mutation`，和断开的 MutationObserver 一致。
//! 被移除的元素（连同子树）和真实页面一样视为已脱离文档，之后的调用返回 `BridgeError::NodeDetached`。

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use super::{Fragment, HostDom, NodeId, ObserverConfig, PageLocation};
use crate::error::{AppError, AppResult, BridgeError};
use crate::scheduler::HostEvent;

const BODY: usize = 0;

#[derive(Debug, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    commit_listener: bool,
    detached: bool,
}

#[derive(Debug)]
struct Tree {
    elements: Vec<Element>,
    bindings: Vec<(String, usize)>,
    location: PageLocation,
    observing: Option<(ObserverConfig, u64)>,
    events: VecDeque<HostEvent>,
    inserted_fragments: usize,
    settle_calls: usize,
    prepare_calls: usize,
    observe_failures: usize,
}

enum SimpleSelector<'a> {
    Class(&'a str),
    Id(&'a str),
    Tag(&'a str),
}

impl<'a> SimpleSelector<'a> {
    fn parse(selector: &'a str) -> Option<Self> {
        let is_ident =
            |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if let Some(class) = selector.strip_prefix('.') {
            is_ident(class).then_some(SimpleSelector::Class(class))
        } else if let Some(id) = selector.strip_prefix('#') {
            is_ident(id).then_some(SimpleSelector::Id(id))
        } else {
            is_ident(selector).then_some(SimpleSelector::Tag(selector))
        }
    }

    fn matches(&self, element: &Element) -> bool {
        match self {
            SimpleSelector::Class(class) => element.classes.iter().any(|c| c == class),
            SimpleSelector::Id(id) => element.attributes.get("id").map(String::as_str) == Some(*id),
            SimpleSelector::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
        }
    }
}

impl Tree {
    fn element(&self, node: NodeId) -> AppResult<&Element> {
        self.elements
            .get(node.0 as usize)
            .filter(|e| !e.detached)
            .ok_or(BridgeError::NodeDetached { node: node.0 }.into())
    }

    fn element_mut(&mut self, node: NodeId) -> AppResult<&mut Element> {
        self.elements
            .get_mut(node.0 as usize)
            .filter(|e| !e.detached)
            .ok_or(BridgeError::NodeDetached { node: node.0 }.into())
    }

    fn detach(&mut self, node: usize) {
        self.elements[node].detached = true;
        for child in self.descendants(node) {
            self.elements[child].detached = true;
        }
    }

    fn record_mutation(&mut self) {
        if let Some((config, generation)) = self.observing {
            if config.child_list {
                self.events.push_back(HostEvent::Mutation { generation });
            }
        }
    }

    fn is_within(&self, node: usize, root: usize) -> bool {
        let mut current = self.elements[node].parent;
        while let Some(parent) = current {
            if parent == root {
                return true;
            }
            current = self.elements[parent].parent;
        }
        false
    }

    fn descendants(&self, root: usize) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.elements[root].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            found.push(node);
            stack.extend(self.elements[node].children.iter().rev().copied());
        }
        found
    }

    fn matches(&self, node: usize, selector: &str) -> bool {
        match SimpleSelector::parse(selector) {
            Some(simple) => simple.matches(&self.elements[node]),
            None => self.bindings.iter().any(|(s, n)| s == selector && *n == node),
        }
    }

    fn select(&self, root: usize, selector: &str) -> Vec<NodeId> {
        match SimpleSelector::parse(selector) {
            Some(simple) => self
                .descendants(root)
                .into_iter()
                .filter(|&n| simple.matches(&self.elements[n]))
                .map(|n| NodeId(n as u64))
                .collect(),
            None => self
                .bindings
                .iter()
                .filter(|(s, n)| s == selector && self.is_within(*n, root))
                .map(|(_, n)| NodeId(*n as u64))
                .collect(),
        }
    }

    fn text_content(&self, node: usize) -> String {
        let element = &self.elements[node];
        let mut text = element.text.clone();
        for &child in &element.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn clear_text(&mut self, node: usize) {
        self.elements[node].text.clear();
        for child in self.elements[node].children.clone() {
            self.clear_text(child);
        }
    }

    fn sibling(&self, node: NodeId, offset: isize) -> AppResult<Option<NodeId>> {
        let Some(parent) = self.element(node)?.parent else {
            return Ok(None);
        };
        let siblings = &self.elements[parent].children;
        let position = siblings.iter().position(|&n| n == node.0 as usize);
        Ok(position
            .and_then(|p| p.checked_add_signed(offset))
            .and_then(|p| siblings.get(p))
            .map(|&n| NodeId(n as u64)))
    }

    fn build(&mut self, fragment: &Fragment, parent: usize) -> usize {
        let id = self.elements.len();
        self.elements.push(Element {
            tag: fragment.tag.clone(),
            classes: fragment.classes.clone(),
            attributes: fragment.attributes.clone(),
            text: fragment.text.clone().unwrap_or_default(),
            parent: Some(parent),
            ..Element::default()
        });
        for _ in &fragment.icons {
            let svg = self.elements.len();
            self.elements.push(Element {
                tag: "svg".to_string(),
                parent: Some(id),
                ..Element::default()
            });
            self.elements[id].children.push(svg);
        }
        for child in &fragment.children {
            let child_id = self.build(child, id);
            self.elements[id].children.push(child_id);
        }
        id
    }
}

/// 进程内 DOM
#[derive(Debug)]
pub struct MemoryDom {
    tree: RefCell<Tree>,
}

impl MemoryDom {
    /// 创建只有 `body` 的空文档
    pub fn new(href: &str) -> Self {
        let body = Element {
            tag: "body".to_string(),
            ..Element::default()
        };
        Self {
            tree: RefCell::new(Tree {
                elements: vec![body],
                bindings: Vec::new(),
                location: PageLocation::from_href(href),
                observing: None,
                events: VecDeque::new(),
                inserted_fragments: 0,
                settle_calls: 0,
                prepare_calls: 0,
                observe_failures: 0,
            }),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId(BODY as u64)
    }

    // ========== 宿主页面一侧的操作 ==========

    /// 宿主页面添加元素
    pub fn add_element(&self, parent: NodeId, tag: &str, classes: &[&str]) -> AppResult<NodeId> {
        self.add_text_element(parent, tag, classes, "")
    }

    /// 宿主页面添加带文本的元素
    pub fn add_text_element(&self, parent: NodeId, tag: &str, classes: &[&str], text: &str) -> AppResult<NodeId> {
        let mut tree = self.tree.borrow_mut();
        tree.element(parent)?;
        let id = tree.elements.len();
        tree.elements.push(Element {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            text: text.to_string(),
            parent: Some(parent.0 as usize),
            ..Element::default()
        });
        tree.element_mut(parent)?.children.push(id);
        tree.record_mutation();
        Ok(NodeId(id as u64))
    }

    /// 宿主页面设置属性（属性变化不触发监听）
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> AppResult<()> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// 宿主页面替换元素自身的文本，子元素保留
    pub fn set_text(&self, node: NodeId, text: &str) -> AppResult<()> {
        let mut tree = self.tree.borrow_mut();
        tree.element_mut(node)?.text = text.to_string();
        tree.record_mutation();
        Ok(())
    }

    /// 宿主页面移除元素（连同子树）
    pub fn remove(&self, node: NodeId) -> AppResult<()> {
        let mut tree = self.tree.borrow_mut();
        let index = node.0 as usize;
        let parent = tree.element(node)?.parent;
        if let Some(parent) = parent {
            tree.elements[parent].children.retain(|&n| n != index);
            tree.elements[index].parent = None;
            tree.record_mutation();
        }
        tree.detach(index);
        Ok(())
    }

    /// 为复杂选择器登记匹配的元素
    pub fn bind(&self, selector: &str, node: NodeId) {
        self.tree
            .borrow_mut()
            .bindings
            .push((selector.to_string(), node.0 as usize));
    }

    /// 模拟用户在输入框中输入后离开
    ///
    /// 只有挂了监听的输入框才会产生事件
    pub fn commit_text(&self, input: NodeId, value: &str) -> AppResult<Option<HostEvent>> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(input)?;
        element.value = value.to_string();
        Ok(element.commit_listener.then(|| HostEvent::TextCommitted {
            value: value.to_string(),
        }))
    }

    /// 接下来 `times` 次 `observe` 调用失败
    pub fn fail_observe(&self, times: usize) {
        self.tree.borrow_mut().observe_failures = times;
    }

    /// 取出积压的变更通知
    pub fn take_events(&self) -> Vec<HostEvent> {
        self.tree.borrow_mut().events.drain(..).collect()
    }

    // ========== 断言辅助 ==========

    pub fn classes_of(&self, node: NodeId) -> AppResult<Vec<String>> {
        Ok(self.tree.borrow().element(node)?.classes.clone())
    }

    pub fn value_of(&self, node: NodeId) -> AppResult<String> {
        Ok(self.tree.borrow().element(node)?.value.clone())
    }

    pub fn attribute_of(&self, node: NodeId, name: &str) -> AppResult<Option<String>> {
        Ok(self.tree.borrow().element(node)?.attributes.get(name).cloned())
    }

    pub fn text_of(&self, node: NodeId) -> AppResult<String> {
        let tree = self.tree.borrow();
        tree.element(node)?;
        Ok(tree.text_content(node.0 as usize))
    }

    pub fn tag_of(&self, node: NodeId) -> AppResult<String> {
        Ok(self.tree.borrow().element(node)?.tag.clone())
    }

    pub fn parent_of(&self, node: NodeId) -> AppResult<Option<NodeId>> {
        Ok(self.tree.borrow().element(node)?.parent.map(|p| NodeId(p as u64)))
    }

    /// 文档中带有某个 class 的元素
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.tree.borrow().select(BODY, &format!(".{}", class))
    }

    /// `root` 后代中带有某个 class 的元素
    pub fn find_by_class_within(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.tree.borrow().select(root.0 as usize, &format!(".{}", class))
    }

    pub fn has_commit_listener(&self, node: NodeId) -> AppResult<bool> {
        Ok(self.tree.borrow().element(node)?.commit_listener)
    }

    /// 通过 `append` / `insert_after` 插入的片段数量
    pub fn inserted_fragments(&self) -> usize {
        self.tree.borrow().inserted_fragments
    }

    pub fn settle_calls(&self) -> usize {
        self.tree.borrow().settle_calls
    }

    pub fn prepare_calls(&self) -> usize {
        self.tree.borrow().prepare_calls
    }

    /// 当前监听使用的代号，未监听时为 `None`
    pub fn observing_generation(&self) -> Option<u64> {
        self.tree.borrow().observing.map(|(_, generation)| generation)
    }
}

impl HostDom for MemoryDom {
    async fn prepare(&self) -> AppResult<()> {
        self.tree.borrow_mut().prepare_calls += 1;
        Ok(())
    }

    async fn location(&self) -> AppResult<PageLocation> {
        Ok(self.tree.borrow().location.clone())
    }

    async fn query_all(&self, selector: &str) -> AppResult<Vec<NodeId>> {
        Ok(self.tree.borrow().select(BODY, selector))
    }

    async fn query_all_within(&self, root: NodeId, selector: &str) -> AppResult<Vec<NodeId>> {
        let tree = self.tree.borrow();
        tree.element(root)?;
        Ok(tree.select(root.0 as usize, selector))
    }

    async fn closest(&self, node: NodeId, selector: &str) -> AppResult<Option<NodeId>> {
        let tree = self.tree.borrow();
        tree.element(node)?;
        let mut current = Some(node.0 as usize);
        while let Some(n) = current {
            if tree.matches(n, selector) {
                return Ok(Some(NodeId(n as u64)));
            }
            current = tree.elements[n].parent;
        }
        Ok(None)
    }

    async fn next_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>> {
        self.tree.borrow().sibling(node, 1)
    }

    async fn previous_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>> {
        self.tree.borrow().sibling(node, -1)
    }

    async fn text_content(&self, node: NodeId) -> AppResult<Option<String>> {
        let tree = self.tree.borrow();
        tree.element(node)?;
        Ok(Some(tree.text_content(node.0 as usize)))
    }

    async fn leading_text(&self, node: NodeId) -> AppResult<Option<String>> {
        let tree = self.tree.borrow();
        let element = tree.element(node)?;
        if !element.text.is_empty() {
            return Ok(Some(element.text.clone()));
        }
        Ok(element.children.first().map(|&c| tree.text_content(c)))
    }

    async fn attribute(&self, node: NodeId, name: &str) -> AppResult<Option<String>> {
        Ok(self.tree.borrow().element(node)?.attributes.get(name).cloned())
    }

    async fn replace_attribute(&self, node: NodeId, name: &str, value: Option<&str>) -> AppResult<()> {
        let mut tree = self.tree.borrow_mut();
        let attributes = &mut tree.element_mut(node)?.attributes;
        match value {
            Some(value) => attributes.insert(name.to_string(), value.to_string()),
            None => attributes.remove(name),
        };
        Ok(())
    }

    async fn has_class(&self, node: NodeId, class: &str) -> AppResult<bool> {
        Ok(self.tree.borrow().element(node)?.classes.iter().any(|c| c == class))
    }

    async fn has_marker(&self, node: NodeId, marker: &str) -> AppResult<bool> {
        let name = format!("data-sl24-{}", marker);
        Ok(self.tree.borrow().element(node)?.attributes.contains_key(&name))
    }

    async fn set_marker(&self, node: NodeId, marker: &str) -> AppResult<()> {
        let name = format!("data-sl24-{}", marker);
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .attributes
            .insert(name, String::new());
        Ok(())
    }

    async fn append(&self, parent: NodeId, fragment: &Fragment) -> AppResult<NodeId> {
        let mut tree = self.tree.borrow_mut();
        tree.element(parent)?;
        let id = tree.build(fragment, parent.0 as usize);
        tree.elements[parent.0 as usize].children.push(id);
        tree.inserted_fragments += 1;
        tree.record_mutation();
        Ok(NodeId(id as u64))
    }

    async fn insert_after(&self, node: NodeId, fragment: &Fragment) -> AppResult<NodeId> {
        let mut tree = self.tree.borrow_mut();
        let parent = tree
            .element(node)?
            .parent
            .ok_or(BridgeError::NodeDetached { node: node.0 })?;
        let id = tree.build(fragment, parent);
        let siblings = &mut tree.elements[parent].children;
        let position = siblings
            .iter()
            .position(|&n| n == node.0 as usize)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(position, id);
        tree.inserted_fragments += 1;
        tree.record_mutation();
        Ok(NodeId(id as u64))
    }

    async fn add_class(&self, node: NodeId, class: &str) -> AppResult<()> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        if !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    async fn set_value(&self, node: NodeId, value: &str) -> AppResult<()> {
        self.tree.borrow_mut().element_mut(node)?.value = value.to_string();
        Ok(())
    }

    async fn listen_text_committed(&self, input: NodeId) -> AppResult<()> {
        self.tree.borrow_mut().element_mut(input)?.commit_listener = true;
        Ok(())
    }

    async fn blank_text_nodes(&self, node: NodeId, needle: &str) -> AppResult<usize> {
        let mut tree = self.tree.borrow_mut();
        let element = tree.element_mut(node)?;
        let mut blanked = 0;
        if element.text.contains(needle) {
            element.text.clear();
            blanked += 1;
        }
        let children = element.children.clone();
        for child in children {
            if tree.text_content(child).contains(needle) {
                tree.clear_text(child);
                blanked += 1;
            }
        }
        Ok(blanked)
    }

    async fn observe(&self, config: ObserverConfig, generation: u64) -> AppResult<()> {
        let mut tree = self.tree.borrow_mut();
        if tree.observe_failures > 0 {
            tree.observe_failures -= 1;
            return Err(AppError::Other("observe 调用失败".to_string()));
        }
        tree.observing = Some((config, generation));
        Ok(())
    }

    async fn disconnect(&self) -> AppResult<()> {
        self.tree.borrow_mut().observing = None;
        Ok(())
    }

    async fn settle(&self) -> AppResult<()> {
        self.tree.borrow_mut().settle_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_and_bound_selectors() {
        let dom = MemoryDom::new("https://example.com/");
        let table = dom.add_element(dom.body(), "table", &["verbtabelle"]).unwrap();
        let cell = dom.add_text_element(table, "td", &["verbzelletd"], "at lege").unwrap();
        dom.bind(".verbzelletd:nth-child(2)", cell);

        assert_eq!(dom.query_all(".verbzelletd").await.unwrap(), vec![cell]);
        assert_eq!(dom.query_all("td").await.unwrap(), vec![cell]);
        assert_eq!(
            dom.query_all(".verbzelletd:nth-child(2)").await.unwrap(),
            vec![cell]
        );
        assert_eq!(dom.closest(cell, ".verbtabelle").await.unwrap(), Some(table));
    }

    #[tokio::test]
    async fn test_removed_nodes_leave_queries() {
        let dom = MemoryDom::new("https://example.com/");
        let item = dom.add_element(dom.body(), "div", &["item"]).unwrap();
        dom.bind("div.item:first-child", item);
        dom.remove(item).unwrap();

        assert!(dom.query_all(".item").await.unwrap().is_empty());
        assert!(dom.query_all("div.item:first-child").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_only_while_observing() {
        let dom = MemoryDom::new("https://example.com/");
        dom.add_element(dom.body(), "div", &[]).unwrap();
        assert!(dom.take_events().is_empty());

        dom.observe(ObserverConfig::CHILD_LIST_SUBTREE, 3).await.unwrap();
        dom.add_element(dom.body(), "div", &[]).unwrap();
        assert_eq!(dom.take_events(), vec![HostEvent::Mutation { generation: 3 }]);

        // 标记是属性，不会触发
        dom.set_marker(dom.body(), "translate").await.unwrap();
        assert!(dom.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_insert_after_keeps_sibling_order() {
        let dom = MemoryDom::new("https://example.com/");
        let first = dom.add_element(dom.body(), "table", &[]).unwrap();
        let last = dom.add_element(dom.body(), "p", &[]).unwrap();
        let inserted = dom.insert_after(first, &Fragment::new("div")).await.unwrap();

        assert_eq!(dom.next_sibling(first).await.unwrap(), Some(inserted));
        assert_eq!(dom.previous_sibling(last).await.unwrap(), Some(inserted));
    }

    #[tokio::test]
    async fn test_removed_subtree_is_detached() {
        let dom = MemoryDom::new("https://example.com/");
        let card = dom.add_element(dom.body(), "div", &["card"]).unwrap();
        let word = dom.add_text_element(card, "div", &["word"], "tak").unwrap();
        dom.remove(card).unwrap();

        for node in [card, word] {
            assert!(matches!(
                dom.text_content(node).await,
                Err(AppError::Bridge(BridgeError::NodeDetached { .. }))
            ));
            assert!(dom.set_marker(node, "writing").await.is_err());
            assert!(dom.classes_of(node).is_err());
        }
        assert!(dom.set_text(word, "tack").is_err());
        assert!(dom.remove(card).is_err());
    }

    #[tokio::test]
    async fn test_unknown_node_is_an_error() {
        let dom = MemoryDom::new("https://example.com/");
        let unknown = NodeId(99);

        assert!(dom.add_element(unknown, "div", &[]).is_err());
        assert!(dom.set_attribute(unknown, "id", "x").is_err());
        assert!(dom.commit_text(unknown, "tak").is_err());
        assert!(dom.text_of(unknown).is_err());
        assert!(dom.replace_attribute(unknown, "href", None).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_attribute_sets_and_removes() {
        let dom = MemoryDom::new("https://example.com/");
        let link = dom.add_element(dom.body(), "a", &[]).unwrap();

        dom.replace_attribute(link, "href", Some("https://a")).await.unwrap();
        assert_eq!(dom.attribute_of(link, "href").unwrap().as_deref(), Some("https://a"));
        dom.replace_attribute(link, "href", None).await.unwrap();
        assert_eq!(dom.attribute_of(link, "href").unwrap(), None);
    }

    #[tokio::test]
    async fn test_observe_failure_injection() {
        let dom = MemoryDom::new("https://example.com/");
        dom.fail_observe(1);

        assert!(dom.observe(ObserverConfig::CHILD_LIST_SUBTREE, 1).await.is_err());
        assert_eq!(dom.observing_generation(), None);
        dom.observe(ObserverConfig::CHILD_LIST_SUBTREE, 2).await.unwrap();
        assert_eq!(dom.observing_generation(), Some(2));
    }
}
