//! 答案比对引擎 - 能力层
//!
//! 判断用户输入的译文与参考译文的关系：完全一致、部分匹配或不匹配。
//! 纯函数，不依赖页面，可以单独测试。

pub mod phrase_set;
pub mod result;
pub mod shape;
pub mod text_comparison;

pub use phrase_set::PhraseSet;
pub use result::ComparisonResult;
pub use shape::ReferenceShape;
pub use text_comparison::{compare, compare_values};
