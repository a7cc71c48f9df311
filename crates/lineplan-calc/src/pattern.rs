//! 群組碼比對
//!
//! 群組碼以前綴方式比對料號，`*` 僅代表單一字元。

/// 群組碼比對器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPattern {
    chars: Vec<char>,
}

impl GroupPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            chars: pattern.trim().chars().collect(),
        }
    }

    /// 料號是否符合群組碼
    ///
    /// 料號長度不得短於群組碼；群組碼之後的字元不限。
    pub fn matches(&self, code: &str) -> bool {
        let mut code_chars = code.chars();
        self.chars.iter().all(|p| match code_chars.next() {
            Some(c) => *p == '*' || *p == c,
            None => false,
        })
    }

    /// 是否含萬用字元
    pub fn is_wildcard(&self) -> bool {
        self.chars.contains(&'*')
    }
}
