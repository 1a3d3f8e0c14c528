//! Deaths per French department.
//!
//! The department is the first two characters of a commune code. Only the
//! metropolitan numeric codes `01`-`95` are valid; anything else (overseas
//! codes, Corsican `2A`/`2B`, foreign places, short codes) is discarded.

use serde::{Deserialize, Serialize};

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::{CanonicalRecord, DatasetView};

/// Location code used to derive the department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationField {
    #[default]
    DeathPlace,
    BirthPlace,
}

impl LocationField {
    fn code(self, record: &CanonicalRecord) -> Option<&str> {
        match self {
            Self::DeathPlace => record.death_place_code.as_deref(),
            Self::BirthPlace => Some(record.birth_place_code.as_str()),
        }
    }
}

/// Department names by code, sorted by code
static DEPARTMENTS: [(&str, &str); 94] = [
    ("01", "Ain"),
    ("02", "Aisne"),
    ("03", "Allier"),
    ("04", "Alpes-de-Haute-Provence"),
    ("05", "Hautes-Alpes"),
    ("06", "Alpes-Maritimes"),
    ("07", "Ardèche"),
    ("08", "Ardennes"),
    ("09", "Ariège"),
    ("10", "Aube"),
    ("11", "Aude"),
    ("12", "Aveyron"),
    ("13", "Bouches-du-Rhône"),
    ("14", "Calvados"),
    ("15", "Cantal"),
    ("16", "Charente"),
    ("17", "Charente-Maritime"),
    ("18", "Cher"),
    ("19", "Corrèze"),
    ("21", "Côte-d'Or"),
    ("22", "Côtes-d'Armor"),
    ("23", "Creuse"),
    ("24", "Dordogne"),
    ("25", "Doubs"),
    ("26", "Drôme"),
    ("27", "Eure"),
    ("28", "Eure-et-Loir"),
    ("29", "Finistère"),
    ("30", "Gard"),
    ("31", "Haute-Garonne"),
    ("32", "Gers"),
    ("33", "Gironde"),
    ("34", "Hérault"),
    ("35", "Ille-et-Vilaine"),
    ("36", "Indre"),
    ("37", "Indre-et-Loire"),
    ("38", "Isère"),
    ("39", "Jura"),
    ("40", "Landes"),
    ("41", "Loir-et-Cher"),
    ("42", "Loire"),
    ("43", "Haute-Loire"),
    ("44", "Loire-Atlantique"),
    ("45", "Loiret"),
    ("46", "Lot"),
    ("47", "Lot-et-Garonne"),
    ("48", "Lozère"),
    ("49", "Maine-et-Loire"),
    ("50", "Manche"),
    ("51", "Marne"),
    ("52", "Haute-Marne"),
    ("53", "Mayenne"),
    ("54", "Meurthe-et-Moselle"),
    ("55", "Meuse"),
    ("56", "Morbihan"),
    ("57", "Moselle"),
    ("58", "Nièvre"),
    ("59", "Nord"),
    ("60", "Oise"),
    ("61", "Orne"),
    ("62", "Pas-de-Calais"),
    ("63", "Puy-de-Dôme"),
    ("64", "Pyrénées-Atlantiques"),
    ("65", "Hautes-Pyrénées"),
    ("66", "Pyrénées-Orientales"),
    ("67", "Bas-Rhin"),
    ("68", "Haut-Rhin"),
    ("69", "Rhône"),
    ("70", "Haute-Saône"),
    ("71", "Saône-et-Loire"),
    ("72", "Sarthe"),
    ("73", "Savoie"),
    ("74", "Haute-Savoie"),
    ("75", "Paris"),
    ("76", "Seine-Maritime"),
    ("77", "Seine-et-Marne"),
    ("78", "Yvelines"),
    ("79", "Deux-Sèvres"),
    ("80", "Somme"),
    ("81", "Tarn"),
    ("82", "Tarn-et-Garonne"),
    ("83", "Var"),
    ("84", "Vaucluse"),
    ("85", "Vendée"),
    ("86", "Vienne"),
    ("87", "Haute-Vienne"),
    ("88", "Vosges"),
    ("89", "Yonne"),
    ("90", "Territoire de Belfort"),
    ("91", "Essonne"),
    ("92", "Hauts-de-Seine"),
    ("93", "Seine-Saint-Denis"),
    ("94", "Val-de-Marne"),
    ("95", "Val-d'Oise"),
];

/// Two-character department code of a commune code, if valid
#[must_use]
pub fn department_code(location: &str) -> Option<&str> {
    let code = location.trim().get(..2)?;
    let number: u8 = code
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| code.parse().ok())??;
    (1..=95).contains(&number).then_some(code)
}

/// Human-readable name of a department, the code itself when unnamed
#[must_use]
pub fn department_name(code: &str) -> &str {
    DEPARTMENTS
        .binary_search_by(|(key, _)| (*key).cmp(code))
        .map_or(code, |idx| DEPARTMENTS[idx].1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    pub code: String,
    pub name: String,
    pub deaths: usize,
}

/// Deaths per valid department
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeographySummary {
    /// Sorted by deaths descending, then code
    pub departments: Vec<DepartmentCount>,
    /// Rows without a valid department code
    pub discarded: usize,
}

impl GeographySummary {
    /// The `n` departments with the most deaths
    #[must_use]
    pub fn top(&self, n: usize) -> &[DepartmentCount] {
        &self.departments[..n.min(self.departments.len())]
    }
}

/// Count deaths per department of `field`
#[must_use]
pub fn deaths_by_department(view: &DatasetView<'_>, field: LocationField) -> Outcome<GeographySummary> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut counts = [0usize; 96];
    let mut discarded = 0;
    for record in view.iter() {
        match field.code(record).and_then(department_code) {
            Some(code) => counts[code.parse::<usize>().unwrap_or_default()] += 1,
            None => discarded += 1,
        }
    }

    let mut departments: Vec<DepartmentCount> = counts
        .iter()
        .enumerate()
        .filter(|(_, deaths)| **deaths > 0)
        .map(|(number, deaths)| {
            let code = format!("{number:02}");
            DepartmentCount {
                name: department_name(&code).to_string(),
                code,
                deaths: *deaths,
            }
        })
        .collect();
    if departments.is_empty() {
        return Outcome::insufficient("no record has a valid department code");
    }
    departments.sort_by(|a, b| b.deaths.cmp(&a.deaths).then_with(|| a.code.cmp(&b.code)));

    Outcome::Ready(GeographySummary {
        departments,
        discarded,
    })
}
