//! 业务服务层

mod order_service;

pub use order_service::OrderService;
