/// The six color buckets of a county margin.
///
/// The margin is the share of party A minus the share of party B. Thresholds are
/// checked with strict comparisons from the top down, so a margin equal to a
/// threshold falls into the bucket below it. In particular an exact tie is `SlightB`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MarginBucket {
    StrongA,
    LeanA,
    SlightA,
    SlightB,
    LeanB,
    StrongB,
}

pub const STRONG_THRESHOLD: f64 = 0.3334;
pub const LEAN_THRESHOLD: f64 = 0.1667;

impl MarginBucket {
    pub const ALL: [MarginBucket; 6] = [
        MarginBucket::StrongA,
        MarginBucket::LeanA,
        MarginBucket::SlightA,
        MarginBucket::SlightB,
        MarginBucket::LeanB,
        MarginBucket::StrongB,
    ];

    /// Fill color used by the map front-end.
    pub fn color(&self) -> &'static str {
        match self {
            MarginBucket::StrongA => "#B82D35",
            MarginBucket::LeanA => "#E48268",
            MarginBucket::SlightA => "#FACCB4",
            MarginBucket::SlightB => "#BFDCEB",
            MarginBucket::LeanB => "#6BACD0",
            MarginBucket::StrongB => "#2A71AE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarginBucket::StrongA => "strong-A",
            MarginBucket::LeanA => "lean-A",
            MarginBucket::SlightA => "slight-A",
            MarginBucket::SlightB => "slight-B",
            MarginBucket::LeanB => "lean-B",
            MarginBucket::StrongB => "strong-B",
        }
    }
}

/// Maps a margin in -1..1 to its bucket. NaN ends up in `StrongB`.
pub fn margin_to_bucket(margin: f64) -> MarginBucket {
    if margin > STRONG_THRESHOLD {
        MarginBucket::StrongA
    } else if margin > LEAN_THRESHOLD {
        MarginBucket::LeanA
    } else if margin > 0.0 {
        MarginBucket::SlightA
    } else if margin > -LEAN_THRESHOLD {
        MarginBucket::SlightB
    } else if margin > -STRONG_THRESHOLD {
        MarginBucket::LeanB
    } else {
        MarginBucket::StrongB
    }
}

pub fn margin_to_color(margin: f64) -> &'static str {
    margin_to_bucket(margin).color()
}
