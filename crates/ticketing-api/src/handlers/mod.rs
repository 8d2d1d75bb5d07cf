//! HTTP 请求处理器模块

pub mod event;
pub mod order;
