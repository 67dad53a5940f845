//! Recorded target motion in CSV form.
//!
//! One row per tick with a header line:
//! `dt,px,py,pz,qx,qy,qz,qw`. Lines starting with `#` are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use nalgebra::{Quaternion, Unit, Vector3};
use serde::Deserialize;

use crate::geometry::Pose;
use crate::imu::MotionSample;

#[derive(Debug, Deserialize)]
struct MotionRecord {
    dt: f64,
    px: f64,
    py: f64,
    pz: f64,
    qx: f64,
    qy: f64,
    qz: f64,
    qw: f64,
}

impl MotionRecord {
    fn into_sample(self) -> Result<MotionSample> {
        if !self.dt.is_finite() {
            bail!("dt is not finite");
        }
        let Some(orientation) =
            Unit::try_new(Quaternion::new(self.qw, self.qx, self.qy, self.qz), 1e-12)
        else {
            bail!("orientation quaternion has zero norm");
        };
        let position = Vector3::new(self.px, self.py, self.pz);
        Ok(MotionSample::new(Pose::new(position, orientation), self.dt))
    }
}

pub fn load_motion_csv<P: AsRef<Path>>(path: P) -> Result<Vec<MotionSample>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_motion_csv(file).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn read_motion_csv<R: Read>(reader: R) -> Result<Vec<MotionSample>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (i, rec) in rdr.deserialize::<MotionRecord>().enumerate() {
        // Row 1 is the header.
        let row = i + 2;
        let rec = rec.with_context(|| format!("row {}", row))?;
        samples.push(rec.into_sample().with_context(|| format!("row {}", row))?);
    }
    Ok(samples)
}
