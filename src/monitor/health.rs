//! Overall system health score.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Good,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub text: &'static str,
    pub kind: RecommendationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthGrade {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub score: u8,
    pub grade: HealthGrade,
    pub recommendations: Vec<Recommendation>,
}

/// Inputs for scoring. Unknown values skip their check.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthInputs {
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
    pub disk_used_percent: Option<f32>,
    pub process_count: Option<usize>,
}

pub fn assess(inputs: &HealthInputs) -> HealthReport {
    use RecommendationKind::{Good, Warning};

    let mut score: i32 = 100;
    let mut recommendations = Vec::new();
    let mut note = |penalty: i32, text: &'static str, kind| {
        score -= penalty;
        recommendations.push(Recommendation { text, kind });
    };

    if let Some(cpu) = inputs.cpu_percent {
        if cpu > 80.0 {
            note(20, "High CPU usage detected", Warning);
        } else if cpu > 60.0 {
            note(10, "Moderate CPU usage", Warning);
        } else {
            note(0, "CPU usage is optimal", Good);
        }
    }

    if let Some(mem) = inputs.memory_percent {
        if mem > 85.0 {
            note(20, "High memory usage - consider closing programs", Warning);
        } else if mem > 70.0 {
            note(10, "Moderate memory usage", Warning);
        } else {
            note(0, "Memory usage is healthy", Good);
        }
    }

    if let Some(disk) = inputs.disk_used_percent {
        if disk > 90.0 {
            note(15, "Disk space critically low - free up space", Warning);
        } else if disk > 80.0 {
            note(10, "Disk space getting low", Warning);
        } else {
            note(0, "Disk space is adequate", Good);
        }
    }

    if inputs.process_count.is_some_and(|n| n > 200) {
        note(5, "Many processes running", Warning);
    }

    let score = score.clamp(0, 100) as u8;
    let grade = match score {
        80.. => HealthGrade::Good,
        60..=79 => HealthGrade::Fair,
        _ => HealthGrade::Poor,
    };

    HealthReport {
        score,
        grade,
        recommendations,
    }
}
