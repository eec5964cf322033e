//! Cross-module behaviour tests

pub(crate) mod support;
