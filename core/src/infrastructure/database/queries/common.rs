pub const HEALTH_CHECK: &str = "SELECT 1";
