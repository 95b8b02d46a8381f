use futures::future::LocalBoxFuture;

use crate::dom::HostDom;

/// 功能求值器
///
/// 每次调度周期被调用一次，自己查询页面、补上缺失的内容。
/// 必须幂等：页面没有变化时连续调用两次，第二次什么都不做。
pub trait Evaluator<D: HostDom> {
    /// 日志中使用的名称
    fn name(&self) -> &'static str;

    /// 是否在开始监听之前先执行一次
    ///
    /// 有些页面在监听开始前就已经渲染好了，不会再产生变更通知。
    fn runs_at_startup(&self) -> bool {
        false
    }

    fn evaluate<'a>(&'a mut self, dom: &'a D) -> LocalBoxFuture<'a, anyhow::Result<()>>;

    /// 用户在本功能插入的输入框中提交了文本
    fn on_text_committed(&mut self, _value: &str) {}
}
