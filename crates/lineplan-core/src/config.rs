//! 引擎配置模型

use serde::{Deserialize, Serialize};

use crate::calendar::SlotCalendar;
use crate::{PlanError, Result};

/// 料號中的固定位移欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeField {
    /// 起始位移（字元）
    pub offset: usize,

    /// 長度（None 表示取到結尾）
    pub len: Option<usize>,
}

impl CodeField {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len: Some(len),
        }
    }

    /// 從位移取到結尾
    pub const fn tail(offset: usize) -> Self {
        Self { offset, len: None }
    }

    /// 擷取欄位，長度不足時返回 None
    pub fn extract<'a>(&self, code: &'a str) -> Option<&'a str> {
        let end = match self.len {
            Some(len) => self.offset.checked_add(len)?,
            None => code.len(),
        };
        if end <= self.offset && self.len.is_some() {
            return None;
        }
        code.get(self.offset..end)
    }
}

/// 料號/群組碼版面：專案、區塊、規格變體的位移定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLayout {
    /// 專案前綴
    pub project: CodeField,

    /// 區塊（產線群組）
    pub block: CodeField,

    /// 顏色/規格變體
    pub variant: CodeField,
}

impl CodeLayout {
    /// 解析專案前綴
    pub fn project_of<'a>(&self, code: &'a str) -> Option<&'a str> {
        self.project.extract(code)
    }

    /// 解析區塊
    pub fn block_of<'a>(&self, code: &'a str) -> Option<&'a str> {
        self.block.extract(code)
    }

    /// 解析規格變體（可為空字串）
    pub fn variant_of<'a>(&self, code: &'a str) -> Option<&'a str> {
        self.variant.extract(code)
    }

    /// 檢查版面設定
    pub fn validate(&self) -> Result<()> {
        for (name, field) in [("project", self.project), ("block", self.block)] {
            if field.len == Some(0) {
                return Err(PlanError::Config(format!("料號欄位 {} 長度不可為 0", name)));
            }
        }
        Ok(())
    }
}

impl Default for CodeLayout {
    fn default() -> Self {
        Self {
            project: CodeField::new(0, 4),
            block: CodeField::new(0, 1),
            variant: CodeField::tail(4),
        }
    }
}

/// 配產引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 料號版面
    pub code_layout: CodeLayout,

    /// 求解時間預算（秒），None 表示等待求解完成
    pub time_budget_secs: Option<u64>,

    /// 進度回報間隔（毫秒）
    pub progress_interval_ms: u64,

    /// 手動指定 big-M（None 時由產能表推導）
    pub big_m: Option<f64>,

    /// 時段日曆
    pub calendar: SlotCalendar,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            code_layout: CodeLayout::default(),
            time_budget_secs: Some(60),
            progress_interval_ms: 500,
            big_m: None,
            calendar: SlotCalendar::default(),
        }
    }

    /// 從 JSON 字串載入
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置料號版面
    pub fn with_code_layout(mut self, layout: CodeLayout) -> Self {
        self.code_layout = layout;
        self
    }

    /// 建構器模式：設置時間預算
    pub fn with_time_budget_secs(mut self, secs: u64) -> Self {
        self.time_budget_secs = Some(secs);
        self
    }

    /// 建構器模式：不設時間預算
    pub fn without_time_budget(mut self) -> Self {
        self.time_budget_secs = None;
        self
    }

    /// 建構器模式：設置進度回報間隔
    pub fn with_progress_interval_ms(mut self, ms: u64) -> Self {
        self.progress_interval_ms = ms;
        self
    }

    /// 建構器模式：手動指定 big-M
    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = Some(big_m);
        self
    }

    /// 建構器模式：設置時段日曆
    pub fn with_calendar(mut self, calendar: SlotCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// 檢查配置
    pub fn validate(&self) -> Result<()> {
        self.code_layout.validate()?;
        if self.calendar.shifts_per_day == 0 {
            return Err(PlanError::Config("每日班次數不可為 0".to_string()));
        }
        if let Some(big_m) = self.big_m {
            if !big_m.is_finite() || big_m <= 0.0 {
                return Err(PlanError::Config(format!("big-M 必須為正數: {}", big_m)));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("LA12-RED", Some("LA12"), Some("L"), Some("-RED"))]
    #[case("LA12", Some("LA12"), Some("L"), Some(""))]
    #[case("LA", None, Some("L"), None)]
    fn test_default_layout(
        #[case] code: &str,
        #[case] project: Option<&str>,
        #[case] block: Option<&str>,
        #[case] variant: Option<&str>,
    ) {
        let layout = CodeLayout::default();
        assert_eq!(layout.project_of(code), project);
        assert_eq!(layout.block_of(code), block);
        assert_eq!(layout.variant_of(code), variant);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_time_budget_secs(5)
            .with_progress_interval_ms(100)
            .with_big_m(1000.0);

        assert_eq!(config.time_budget_secs, Some(5));
        assert_eq!(config.progress_interval_ms, 100);
        assert_eq!(config.big_m, Some(1000.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "time_budget_secs": 12,
            "code_layout": {
                "project": { "offset": 1, "len": 3 },
                "block": { "offset": 0, "len": 2 },
                "variant": { "offset": 4, "len": null }
            }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.time_budget_secs, Some(12));
        assert_eq!(config.progress_interval_ms, 500);
        assert_eq!(config.code_layout.project_of("XAB1-9"), Some("AB1"));
        assert_eq!(config.code_layout.block_of("XAB1-9"), Some("XA"));
    }

    #[test]
    fn test_null_time_budget_means_unbounded() {
        let config = EngineConfig::from_json_str(r#"{ "time_budget_secs": null }"#).unwrap();
        assert_eq!(config.time_budget_secs, None);

        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.time_budget_secs, Some(60));
        assert_eq!(EngineConfig::new().without_time_budget().time_budget_secs, None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero_project = r#"{ "code_layout": {
            "project": { "offset": 0, "len": 0 },
            "block": { "offset": 0, "len": 1 },
            "variant": { "offset": 1, "len": null }
        } }"#;
        assert!(matches!(
            EngineConfig::from_json_str(zero_project),
            Err(PlanError::Config(_))
        ));

        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(PlanError::ConfigParse(_))
        ));

        let negative_big_m = EngineConfig::new().with_big_m(-1.0);
        assert!(negative_big_m.validate().is_err());
    }
}
