// ==========================================
// 集成测试共享辅助
// ==========================================

pub mod mock_config;
pub mod staged_row_builder;
