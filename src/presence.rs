// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/presence.rs - 用户在场检测
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

use crate::keypoint::{Keypoint, Landmark};

pub const DEFAULT_MIN_VISIBILITY: f64 = 0.75;

const SHOULDERS: [Landmark; 2] = [Landmark::LeftShoulder, Landmark::RightShoulder];
const FACE: [Landmark; 3] = [Landmark::Nose, Landmark::LeftEar, Landmark::RightEar];

/// 至少一个肩膀和一个面部关键点（鼻子或耳朵）置信度超过下限时，认为用户在画面中。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceFilter {
  min_visibility: f64,
}

impl Default for PresenceFilter {
  fn default() -> Self {
    Self {
      min_visibility: DEFAULT_MIN_VISIBILITY,
    }
  }
}

impl PresenceFilter {
  pub fn new(min_visibility: f64) -> Self {
    Self { min_visibility }
  }

  pub fn min_visibility(&self) -> f64 {
    self.min_visibility
  }

  pub fn is_present(&self, landmarks: &[Keypoint]) -> bool {
    self.any_visible(landmarks, &SHOULDERS) && self.any_visible(landmarks, &FACE)
  }

  fn any_visible(&self, landmarks: &[Keypoint], marks: &[Landmark]) -> bool {
    marks.iter().any(|mark| {
      mark
        .get(landmarks)
        .is_some_and(|p| p.is_visible(self.min_visibility))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::keypoint::LANDMARK_COUNT;

  fn frame(visibility: f64) -> Vec<Keypoint> {
    vec![Keypoint::new(0.5, 0.5, 0.0, visibility); LANDMARK_COUNT]
  }

  #[test]
  fn confident_frame_is_present() {
    assert!(PresenceFilter::default().is_present(&frame(0.9)));
  }

  #[test]
  fn one_shoulder_and_one_ear_suffice() {
    let mut landmarks = frame(0.1);
    landmarks[Landmark::RightShoulder.index()].visibility = 0.8;
    landmarks[Landmark::LeftEar.index()].visibility = 0.8;
    assert!(PresenceFilter::default().is_present(&landmarks));
  }

  #[test]
  fn eyes_do_not_count_as_face() {
    let mut landmarks = frame(0.1);
    landmarks[Landmark::LeftShoulder.index()].visibility = 0.9;
    landmarks[Landmark::LeftEye.index()].visibility = 0.9;
    landmarks[Landmark::RightEye.index()].visibility = 0.9;
    assert!(!PresenceFilter::default().is_present(&landmarks));
  }

  #[test]
  fn low_shoulder_confidence_means_absent() {
    let mut landmarks = frame(0.99);
    landmarks[Landmark::LeftShoulder.index()].visibility = 0.5;
    landmarks[Landmark::RightShoulder.index()].visibility = 0.5;
    assert!(!PresenceFilter::default().is_present(&landmarks));
  }

  #[test]
  fn floor_is_exclusive() {
    assert!(!PresenceFilter::default().is_present(&frame(0.75)));
  }

  #[test]
  fn custom_floor_is_respected() {
    let relaxed = PresenceFilter::new(0.5);
    assert_eq!(relaxed.min_visibility(), 0.5);
    assert!(relaxed.is_present(&frame(0.6)));
    assert!(!PresenceFilter::default().is_present(&frame(0.6)));
  }

  #[test]
  fn truncated_frame_is_absent() {
    assert!(!PresenceFilter::default().is_present(&frame(0.9)[..11]));
    assert!(!PresenceFilter::default().is_present(&[]));
  }
}
