use serde::Serialize;

/// An entry in the quick-pick list offered next to the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProteinEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub static POPULAR_PROTEINS: [ProteinEntry; 10] = [
    ProteinEntry { id: "1ubq", name: "Ubiquitin", description: "Protein modification and degradation" },
    ProteinEntry { id: "1crn", name: "Crambin", description: "Plant seed protein" },
    ProteinEntry { id: "4hhb", name: "Hemoglobin", description: "Oxygen transport protein" },
    ProteinEntry { id: "1ins", name: "Insulin", description: "Blood sugar regulation" },
    ProteinEntry { id: "1tim", name: "Triose Phosphate Isomerase", description: "Glycolysis enzyme" },
    ProteinEntry { id: "3cna", name: "Concanavalin A", description: "Plant lectin protein" },
    ProteinEntry { id: "1gfl", name: "Green Fluorescent Protein", description: "Fluorescent protein from jellyfish" },
    ProteinEntry { id: "1hho", name: "Human Growth Hormone", description: "Growth regulation protein" },
    ProteinEntry { id: "2lyz", name: "Lysozyme", description: "Antibacterial enzyme" },
    ProteinEntry { id: "1col", name: "Collagen", description: "Structural protein" },
];

pub fn find_protein(id: &str) -> Option<&'static ProteinEntry> {
    POPULAR_PROTEINS
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

pub fn description_for(id: &str) -> Option<&'static str> {
    find_protein(id).map(|p| p.description)
}
