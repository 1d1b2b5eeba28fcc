//
// Copyright (c) 2024 ZettaScale Technology
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ZettaScale Zenoh Team, <zenoh@zettascale.tech>
//

//! Quality of service primitives.
use weft_result::{bail, WResult};

/// The kind of congestion control a publication applies when a receiver's
/// queue is full.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CongestionControl {
    /// Allows the publication to be dropped for the congested receiver.
    #[default]
    Drop = 0,
    /// Holds the publication back until the congested receiver has room.
    Block = 1,
}

/// The priority of a publication, carried on each sample for receivers to
/// inspect.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    RealTime = 1,
    InteractiveHigh = 2,
    InteractiveLow = 3,
    DataHigh = 4,
    #[default]
    Data = 5,
    DataLow = 6,
    Background = 7,
}

impl Priority {
    /// Default
    pub const DEFAULT: Self = Self::Data;
    /// The lowest Priority
    pub const MIN: Self = Self::Background;
    /// The highest Priority
    pub const MAX: Self = Self::RealTime;
}

impl TryFrom<u8> for Priority {
    type Error = weft_result::Error;

    fn try_from(v: u8) -> WResult<Self> {
        match v {
            1 => Ok(Priority::RealTime),
            2 => Ok(Priority::InteractiveHigh),
            3 => Ok(Priority::InteractiveLow),
            4 => Ok(Priority::DataHigh),
            5 => Ok(Priority::Data),
            6 => Ok(Priority::DataLow),
            7 => Ok(Priority::Background),
            unknown => bail!(
                "{} is not a valid priority value. Admitted values are: [{}-{}].",
                unknown,
                Priority::MAX as u8,
                Priority::MIN as u8
            ),
        }
    }
}

/// The reliability a publisher advertises for its publications.
///
/// Inside a single process every delivery is reliable by construction; the
/// value is carried so receivers can reason about it uniformly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reliability {
    BestEffort = 0,
    #[default]
    Reliable = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_from_u8() {
        assert_eq!(Priority::try_from(1).unwrap(), Priority::RealTime);
        assert_eq!(Priority::try_from(5).unwrap(), Priority::Data);
        assert!(Priority::try_from(0).is_err());
        assert!(Priority::try_from(8).is_err());
    }
}
