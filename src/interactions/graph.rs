use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};

use super::{InteractionAssessment, InteractionError, InteractionScorer};

pub const DRUGS: &[&str] = &[
    "Aspirin",
    "Ibuprofen",
    "Paracetamol",
    "Amoxicillin",
    "Atorvastatin",
    "Metformin",
    "Lisinopril",
    "Omeprazole",
    "Warfarin",
    "Simvastatin",
    "Azithromycin",
    "Ciprofloxacin",
    "Prednisone",
    "Albuterol",
    "Levothyroxine",
];

/// Known pairwise interactions (undirected).
pub const INTERACTIONS: &[(&str, &str)] = &[
    ("Aspirin", "Warfarin"),
    ("Ibuprofen", "Warfarin"),
    ("Aspirin", "Ibuprofen"),
    ("Paracetamol", "Amoxicillin"),
    ("Atorvastatin", "Simvastatin"),
    ("Azithromycin", "Ciprofloxacin"),
    ("Prednisone", "Albuterol"),
    ("Lisinopril", "Omeprazole"),
    ("Metformin", "Atorvastatin"),
];

/// Risk assigned to a pair that shares a direct edge.
const DIRECT_RISK: f64 = 1.0;

/// Scale applied to neighbourhood similarity for indirect pairs.
const INDIRECT_SCALE: f64 = 0.5;

/// Interaction scorer backed by an undirected drug graph.
///
/// Direct edges score 1.0. Other pairs score half the Jaccard similarity
/// of their interaction partners, so two drugs that interact with the same
/// third drug carry some signal without being flagged.
pub struct GraphInteractionScorer {
    graph: UnGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl GraphInteractionScorer {
    pub fn new(drugs: &[&str], interactions: &[(&str, &str)]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = HashMap::new();

        for &drug in drugs {
            let node = graph.add_node(drug.to_string());
            index.insert(drug.to_lowercase(), node);
        }

        for &(a, b) in interactions {
            match (index.get(&a.to_lowercase()), index.get(&b.to_lowercase())) {
                (Some(&na), Some(&nb)) => {
                    graph.update_edge(na, nb, ());
                }
                _ => tracing::warn!(drug_a = a, drug_b = b, "Interaction references unknown drug"),
            }
        }

        Self { graph, index }
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex, InteractionError> {
        self.index
            .get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| InteractionError::UnknownDrug(name.trim().to_string()))
    }

    fn partners(&self, node: NodeIndex) -> HashSet<NodeIndex> {
        self.graph.neighbors(node).collect()
    }

    fn neighbourhood_similarity(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        let pa = self.partners(a);
        let pb = self.partners(b);
        let union = pa.union(&pb).count();
        if union == 0 {
            return 0.0;
        }
        pa.intersection(&pb).count() as f64 / union as f64
    }
}

impl Default for GraphInteractionScorer {
    fn default() -> Self {
        Self::new(DRUGS, INTERACTIONS)
    }
}

impl InteractionScorer for GraphInteractionScorer {
    fn score(&self, drug_a: &str, drug_b: &str) -> Result<InteractionAssessment, InteractionError> {
        let a = self.lookup(drug_a)?;
        let b = self.lookup(drug_b)?;
        let name_a = self.graph[a].clone();
        let name_b = self.graph[b].clone();

        if a == b {
            return Ok(InteractionAssessment {
                message: format!("{name_a} was selected twice; no interaction to assess."),
                drug_a: name_a,
                drug_b: name_b,
                interaction: false,
                risk: 0.0,
                same_drug: true,
            });
        }

        let interaction = self.graph.contains_edge(a, b);
        let risk = if interaction {
            DIRECT_RISK
        } else {
            INDIRECT_SCALE * self.neighbourhood_similarity(a, b)
        };
        let risk = (risk * 100.0).round() / 100.0;

        let message = if interaction {
            format!("Interaction detected between {name_a} and {name_b}. Consult a pharmacist or physician.")
        } else {
            format!("No known interaction between {name_a} and {name_b}.")
        };

        tracing::debug!(drug_a = %name_a, drug_b = %name_b, interaction, risk, "Interaction scored");

        Ok(InteractionAssessment {
            drug_a: name_a,
            drug_b: name_b,
            interaction,
            risk,
            same_drug: false,
            message,
        })
    }

    fn known_drugs(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }
}
