//! Fixtures shared by the storage tests

use super::Database;
use super::models::{NewAsset, NewRisk, NewThreat, NewVulnerability};
use crate::domain::{Money, RiskStatus, ThreatType};

/// IDs of one asset, one of its vulnerabilities and one threat
pub struct Graph {
    pub asset_id: i64,
    pub vulnerability_id: i64,
    pub threat_id: i64,
}

pub fn sample_asset(name: &str) -> NewAsset {
    NewAsset {
        name: name.to_string(),
        description: format!("{} used in tests", name),
        value: Money::from_cents(100_000),
        category: "Hardware".to_string(),
    }
}

/// Insert "Web server", a vulnerability on it and an "Attacker" threat
pub fn seed_graph(db: &Database) -> Graph {
    let asset = db.create_asset(&sample_asset("Web server")).expect("asset");
    let vulnerability = db
        .create_vulnerability(&NewVulnerability {
            name: "Outdated TLS".to_string(),
            description: "TLS 1.0 still enabled".to_string(),
            asset_id: asset.id,
            severity: 7,
        })
        .expect("vulnerability");
    let threat = db
        .create_threat(&NewThreat {
            name: "Attacker".to_string(),
            description: "Opportunistic external attacker".to_string(),
            threat_type: ThreatType::External,
            likelihood: 6,
        })
        .expect("threat");

    Graph {
        asset_id: asset.id,
        vulnerability_id: vulnerability.id,
        threat_id: threat.id,
    }
}

pub fn new_risk(graph: &Graph, name: &str, likelihood: i64, impact: i64) -> NewRisk {
    NewRisk {
        name: name.to_string(),
        description: String::new(),
        asset_id: graph.asset_id,
        vulnerability_id: graph.vulnerability_id,
        threat_id: graph.threat_id,
        likelihood,
        impact,
        status: RiskStatus::Identified,
        mitigation_plan: None,
    }
}
