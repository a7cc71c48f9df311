//! 時段日曆模型
//!
//! 時段（班次）從 1 開始編號，每個工作日有 `shifts_per_day` 個時段。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 時段日曆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCalendar {
    /// 排程起始日（時段 1 落在此日或其後第一個工作日）
    pub plan_start: NaiveDate,

    /// 每日班次數
    pub shifts_per_day: u32,

    /// 工作日（索引 0 = 週一, ..., 6 = 週日）
    pub working_days: [bool; 7],

    /// 節假日列表
    pub holidays: Vec<NaiveDate>,
}

impl SlotCalendar {
    /// 創建新的時段日曆（預設週一到週五、每日兩班）
    pub fn new(plan_start: NaiveDate) -> Self {
        Self {
            plan_start,
            shifts_per_day: 2,
            working_days: [true, true, true, true, true, false, false],
            holidays: Vec::new(),
        }
    }

    /// 建構器模式：設置每日班次數
    pub fn with_shifts_per_day(mut self, shifts: u32) -> Self {
        self.shifts_per_day = shifts;
        self
    }

    /// 建構器模式：設置工作日
    pub fn with_working_days(mut self, working_days: [bool; 7]) -> Self {
        self.working_days = working_days;
        self
    }

    /// 建構器模式：添加節假日
    pub fn with_holidays(mut self, holidays: Vec<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    /// 檢查是否為工作日
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if self.holidays.contains(&date) {
            return false;
        }
        let weekday_index = date.weekday().num_days_from_monday() as usize;
        self.working_days[weekday_index]
    }

    /// 時段所在日期
    ///
    /// 時段 0、每日班次為 0、或日曆沒有任何工作日時返回 None。
    pub fn date_of_slot(&self, slot: u32) -> Option<NaiveDate> {
        if slot == 0 || self.shifts_per_day == 0 || !self.working_days.iter().any(|d| *d) {
            return None;
        }

        let mut current = self.plan_start;
        while !self.is_working_day(current) {
            current = current.succ_opt()?;
        }

        let mut remaining = (slot - 1) / self.shifts_per_day;
        while remaining > 0 {
            current = current.succ_opt()?;
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }

        Some(current)
    }

    /// 時段日期距離交期的天數（正數表示提前完成）
    pub fn lead_time_days(&self, slot: u32, due_date: NaiveDate) -> Option<i64> {
        self.date_of_slot(slot)
            .map(|date| (due_date - date).num_days())
    }
}

impl Default for SlotCalendar {
    fn default() -> Self {
        Self::new(NaiveDate::default())
    }
}
