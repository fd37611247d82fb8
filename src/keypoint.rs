// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/keypoint.rs - 关键点定义
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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// BlazePose 每帧输出的关键点数量
pub const LANDMARK_COUNT: usize = 33;

/// 单个关键点：归一化图像坐标 + 置信度
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
  pub x: f64,
  pub y: f64,
  #[serde(default)]
  pub z: f64,
  #[serde(default)]
  pub visibility: f64,
}

impl Keypoint {
  pub const fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
    Self {
      x,
      y,
      z,
      visibility,
    }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
  }

  pub fn is_visible(&self, min_visibility: f64) -> bool {
    self.visibility > min_visibility
  }
}

/// 姿态判断用到的 BlazePose 关键点（值即检测器索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Landmark {
  Nose = 0,
  LeftEye = 2,
  RightEye = 5,
  LeftEar = 7,
  RightEar = 8,
  LeftShoulder = 11,
  RightShoulder = 12,
}

impl Landmark {
  /// 参与评分的关键点，顺序即 `NormalizedPose` 内部存储顺序
  pub const TRACKED: [Landmark; 7] = [
    Landmark::Nose,
    Landmark::LeftEye,
    Landmark::RightEye,
    Landmark::LeftEar,
    Landmark::RightEar,
    Landmark::LeftShoulder,
    Landmark::RightShoulder,
  ];

  pub const fn index(self) -> usize {
    self as usize
  }

  /// 在 `TRACKED` 中的位置
  pub const fn slot(self) -> usize {
    match self {
      Landmark::Nose => 0,
      Landmark::LeftEye => 1,
      Landmark::RightEye => 2,
      Landmark::LeftEar => 3,
      Landmark::RightEar => 4,
      Landmark::LeftShoulder => 5,
      Landmark::RightShoulder => 6,
    }
  }

  pub const fn name(self) -> &'static str {
    match self {
      Landmark::Nose => "nose",
      Landmark::LeftEye => "left_eye",
      Landmark::RightEye => "right_eye",
      Landmark::LeftEar => "left_ear",
      Landmark::RightEar => "right_ear",
      Landmark::LeftShoulder => "left_shoulder",
      Landmark::RightShoulder => "right_shoulder",
    }
  }

  pub fn get(self, landmarks: &[Keypoint]) -> Option<&Keypoint> {
    landmarks.get(self.index())
  }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
  #[error("缺少关键点 {}（索引 {}），当前帧只有 {len} 个关键点", .landmark.name(), .landmark.index())]
  Missing { landmark: Landmark, len: usize },
  #[error("关键点 {} 坐标无效", .0.name())]
  NonFinite(Landmark),
}

/// 在系统边界校验过的关键点集合，之后按名字访问
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseLandmarks {
  points: [Keypoint; 7],
}

impl PoseLandmarks {
  pub fn from_slice(landmarks: &[Keypoint]) -> Result<Self, LandmarkError> {
    let mut points = [Keypoint::default(); 7];
    for landmark in Landmark::TRACKED {
      let point = landmark.get(landmarks).ok_or(LandmarkError::Missing {
        landmark,
        len: landmarks.len(),
      })?;
      if !point.is_finite() {
        return Err(LandmarkError::NonFinite(landmark));
      }
      points[landmark.slot()] = *point;
    }
    Ok(Self { points })
  }

  pub fn get(&self, landmark: Landmark) -> &Keypoint {
    &self.points[landmark.slot()]
  }

  pub fn left_shoulder(&self) -> &Keypoint {
    self.get(Landmark::LeftShoulder)
  }

  pub fn right_shoulder(&self) -> &Keypoint {
    self.get(Landmark::RightShoulder)
  }

  pub fn iter(&self) -> impl Iterator<Item = (Landmark, &Keypoint)> {
    Landmark::TRACKED.into_iter().map(|l| (l, self.get(l)))
  }
}

impl TryFrom<&[Keypoint]> for PoseLandmarks {
  type Error = LandmarkError;

  fn try_from(landmarks: &[Keypoint]) -> Result<Self, Self::Error> {
    Self::from_slice(landmarks)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full_frame() -> Vec<Keypoint> {
    (0..LANDMARK_COUNT)
      .map(|i| Keypoint::new(i as f64 * 0.01, 0.5, 0.0, 0.9))
      .collect()
  }

  #[test]
  fn indices_follow_blazepose() {
    assert_eq!(Landmark::Nose.index(), 0);
    assert_eq!(Landmark::LeftEye.index(), 2);
    assert_eq!(Landmark::RightEye.index(), 5);
    assert_eq!(Landmark::LeftEar.index(), 7);
    assert_eq!(Landmark::RightEar.index(), 8);
    assert_eq!(Landmark::LeftShoulder.index(), 11);
    assert_eq!(Landmark::RightShoulder.index(), 12);
  }

  #[test]
  fn slots_match_tracked_order() {
    for (i, landmark) in Landmark::TRACKED.iter().enumerate() {
      assert_eq!(landmark.slot(), i);
    }
  }

  #[test]
  fn from_slice_picks_named_points() {
    let frame = full_frame();
    let pose = PoseLandmarks::from_slice(&frame).unwrap();
    assert!((pose.get(Landmark::RightEar).x - 0.08).abs() < 1e-12);
    assert!((pose.left_shoulder().x - 0.11).abs() < 1e-12);
  }

  #[test]
  fn thirteen_points_are_enough() {
    let frame = &full_frame()[..13];
    assert!(PoseLandmarks::try_from(frame).is_ok());
  }

  #[test]
  fn short_frame_is_rejected() {
    let frame = &full_frame()[..12];
    let err = PoseLandmarks::from_slice(frame).unwrap_err();
    assert_eq!(
      err,
      LandmarkError::Missing {
        landmark: Landmark::RightShoulder,
        len: 12
      }
    );
  }

  #[test]
  fn nan_coordinate_is_rejected() {
    let mut frame = full_frame();
    frame[0].y = f64::NAN;
    assert_eq!(
      PoseLandmarks::from_slice(&frame).unwrap_err(),
      LandmarkError::NonFinite(Landmark::Nose)
    );
  }

  #[test]
  fn keypoint_defaults_missing_depth_and_visibility() {
    let point: Keypoint = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
    assert_eq!(point, Keypoint::new(0.1, 0.2, 0.0, 0.0));
  }
}
