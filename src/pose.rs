// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/pose.rs - 以肩部为基准的姿态归一化
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

use thiserror::Error;

use crate::keypoint::{Keypoint, Landmark, LandmarkError, PoseLandmarks};

/// 肩宽低于该值视为退化帧
pub const MIN_SHOULDER_WIDTH: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

/// 以肩部中点为原点、肩宽为单位长度的姿态
///
/// 归一化后的坐标与用户离摄像头的远近以及画面平移无关；
/// 远近变化单独保留在 `shoulder_width` 中，由评分器计算前倾/后仰惩罚。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPose {
  points: [NormalizedPoint; 7],
  shoulder_width: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
  #[error("肩宽无效: {0}")]
  DegenerateShoulders(f64),
  #[error("关键点错误: {0}")]
  Landmark(#[from] LandmarkError),
}

impl NormalizedPose {
  pub fn point(&self, landmark: Landmark) -> &NormalizedPoint {
    &self.points[landmark.slot()]
  }

  pub fn points(&self) -> impl Iterator<Item = (Landmark, &NormalizedPoint)> {
    Landmark::TRACKED.into_iter().map(|l| (l, self.point(l)))
  }

  /// 归一化之前的肩宽（图像平面内）
  pub fn shoulder_width(&self) -> f64 {
    self.shoulder_width
  }
}

pub fn normalize(landmarks: &PoseLandmarks) -> Result<NormalizedPose, NormalizeError> {
  let left = landmarks.left_shoulder();
  let right = landmarks.right_shoulder();

  let shoulder_width = ((left.x - right.x).powi(2) + (left.y - right.y).powi(2)).sqrt();
  if !shoulder_width.is_finite() || shoulder_width < MIN_SHOULDER_WIDTH {
    return Err(NormalizeError::DegenerateShoulders(shoulder_width));
  }

  let center = Keypoint::new(
    (left.x + right.x) / 2.0,
    (left.y + right.y) / 2.0,
    (left.z + right.z) / 2.0,
    0.0,
  );

  let mut points = [NormalizedPoint::default(); 7];
  for (landmark, p) in landmarks.iter() {
    points[landmark.slot()] = NormalizedPoint {
      x: (p.x - center.x) / shoulder_width,
      y: (p.y - center.y) / shoulder_width,
      z: (p.z - center.z) / shoulder_width,
    };
  }

  Ok(NormalizedPose {
    points,
    shoulder_width,
  })
}

/// 直接从检测器输出的关键点列表归一化
pub fn normalize_slice(landmarks: &[Keypoint]) -> Result<NormalizedPose, NormalizeError> {
  let landmarks = PoseLandmarks::from_slice(landmarks)?;
  normalize(&landmarks)
}
