// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/output/title.rs - 窗口标题闪烁
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

pub const FLASH_INTERVAL_MS: f64 = 500.0;
pub const FLASH_DURATION_MS: f64 = 5000.0;
pub const WARNING_TITLE: &str = "⚠️ 请调整坐姿！⚠️";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleFrame {
  Warning,
  Original,
}

/// 标题闪烁的时间表：每 500ms 切换一次，5 秒后恢复
#[derive(Debug, Clone, Default)]
pub struct TitleFlash {
  started_ms: Option<f64>,
}

impl TitleFlash {
  /// 开始闪烁；已经在闪烁时不重新计时
  pub fn start(&mut self, now_ms: f64) -> bool {
    if self.is_active(now_ms) {
      return false;
    }
    self.started_ms = Some(now_ms);
    true
  }

  pub fn is_active(&self, now_ms: f64) -> bool {
    self
      .started_ms
      .is_some_and(|start| now_ms - start < FLASH_DURATION_MS)
  }

  pub fn stop(&mut self) {
    self.started_ms = None;
  }

  pub fn title_at(&mut self, now_ms: f64) -> TitleFrame {
    let Some(start) = self.started_ms else {
      return TitleFrame::Original;
    };
    let elapsed = (now_ms - start).max(0.0);
    if elapsed >= FLASH_DURATION_MS {
      self.started_ms = None;
      return TitleFrame::Original;
    }
    let tick = (elapsed / FLASH_INTERVAL_MS).floor() as u64;
    if tick % 2 == 1 {
      TitleFrame::Warning
    } else {
      TitleFrame::Original
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alternates_then_stops() {
    let mut flash = TitleFlash::default();
    assert!(flash.start(1000.0));
    assert_eq!(flash.title_at(1100.0), TitleFrame::Original);
    assert_eq!(flash.title_at(1600.0), TitleFrame::Warning);
    assert_eq!(flash.title_at(2100.0), TitleFrame::Original);
    assert_eq!(flash.title_at(2600.0), TitleFrame::Warning);
    assert_eq!(flash.title_at(6000.0), TitleFrame::Original);
    assert!(!flash.is_active(6000.0));
  }

  #[test]
  fn restart_while_active_is_ignored() {
    let mut flash = TitleFlash::default();
    assert!(flash.start(0.0));
    assert!(!flash.start(2000.0));
    assert!(flash.start(5000.0));
  }
}
