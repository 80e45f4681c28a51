use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const CANONICAL_TEAMS: [&str; 32] = [
    "Arizona Cardinals",
    "Atlanta Falcons",
    "Baltimore Ravens",
    "Buffalo Bills",
    "Carolina Panthers",
    "Chicago Bears",
    "Cincinnati Bengals",
    "Cleveland Browns",
    "Dallas Cowboys",
    "Denver Broncos",
    "Detroit Lions",
    "Green Bay Packers",
    "Houston Texans",
    "Indianapolis Colts",
    "Jacksonville Jaguars",
    "Kansas City Chiefs",
    "Las Vegas Raiders",
    "Los Angeles Chargers",
    "Los Angeles Rams",
    "Miami Dolphins",
    "Minnesota Vikings",
    "New England Patriots",
    "New Orleans Saints",
    "New York Giants",
    "New York Jets",
    "Philadelphia Eagles",
    "Pittsburgh Steelers",
    "San Francisco 49ers",
    "Seattle Seahawks",
    "Tampa Bay Buccaneers",
    "Tennessee Titans",
    "Washington Commanders",
];

// City, nickname, legacy and abbreviation aliases, keyed to the canonical name.
const ALIASES: &[(&str, &[&str])] = &[
    ("Arizona Cardinals", &["Arizona", "Phoenix", "Glendale", "Cardinals", "ARI"]),
    ("Atlanta Falcons", &["Atlanta", "Falcons", "ATL"]),
    ("Baltimore Ravens", &["Baltimore", "Ravens", "BAL"]),
    ("Buffalo Bills", &["Buffalo", "Orchard Park", "Bills", "BUF"]),
    ("Carolina Panthers", &["Carolina", "Charlotte", "Panthers", "CAR"]),
    ("Chicago Bears", &["Chicago", "Bears", "CHI"]),
    ("Cincinnati Bengals", &["Cincinnati", "Bengals", "CIN"]),
    ("Cleveland Browns", &["Cleveland", "Browns", "CLE"]),
    ("Dallas Cowboys", &["Dallas", "Arlington", "Cowboys", "DAL"]),
    ("Denver Broncos", &["Denver", "Broncos", "DEN"]),
    ("Detroit Lions", &["Detroit", "Lions", "DET"]),
    ("Green Bay Packers", &["Green Bay", "Packers", "GB", "GNB"]),
    ("Houston Texans", &["Houston", "Texans", "HOU"]),
    ("Indianapolis Colts", &["Indianapolis", "Colts", "IND"]),
    ("Jacksonville Jaguars", &["Jacksonville", "Jaguars", "JAX", "JAC"]),
    ("Kansas City Chiefs", &["Kansas City", "Chiefs", "KC", "KAN"]),
    (
        "Las Vegas Raiders",
        &["Las Vegas", "Oakland", "Oakland Raiders", "LA Raiders", "Raiders", "LV", "OAK", "RAI"],
    ),
    (
        "Los Angeles Chargers",
        &["LA Chargers", "San Diego", "San Diego Chargers", "Chargers", "LAC", "SD"],
    ),
    (
        "Los Angeles Rams",
        &["LA Rams", "St Louis", "St Louis Rams", "Rams", "LAR", "STL"],
    ),
    ("Miami Dolphins", &["Miami", "Dolphins", "MIA"]),
    ("Minnesota Vikings", &["Minnesota", "Minneapolis", "Vikings", "MIN"]),
    (
        "New England Patriots",
        &["New England", "Foxborough", "Foxboro", "Patriots", "NE", "NWE"],
    ),
    ("New Orleans Saints", &["New Orleans", "NOLA", "Saints", "NO", "NOR"]),
    ("New York Giants", &["NY Giants", "Giants", "NYG"]),
    ("New York Jets", &["NY Jets", "Jets", "NYJ"]),
    ("Philadelphia Eagles", &["Philadelphia", "Philly", "Eagles", "PHI", "PHL"]),
    ("Pittsburgh Steelers", &["Pittsburgh", "Steelers", "PIT"]),
    (
        "San Francisco 49ers",
        &[
            "San Francisco",
            "SF 49ers",
            "Santa Clara",
            "49ers",
            "Niners",
            "Forty Niners",
            "SF",
            "SFO",
        ],
    ),
    ("Seattle Seahawks", &["Seattle", "Seahawks", "SEA"]),
    (
        "Tampa Bay Buccaneers",
        &["Tampa Bay", "Tampa", "Buccaneers", "Bucs", "TB", "TAM", "TBB"],
    ),
    ("Tennessee Titans", &["Tennessee", "Nashville", "Titans", "TEN", "OTI"]),
    (
        "Washington Commanders",
        &[
            "Washington",
            "Washington Football Team",
            "Redskins",
            "Commanders",
            "WSH",
            "WAS",
            "WDC",
        ],
    ),
];

static ALIAS_MAP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for team in CANONICAL_TEAMS {
        map.insert(lookup_key(team), team);
    }
    for (team, aliases) in ALIASES {
        for alias in *aliases {
            map.insert(lookup_key(alias), *team);
        }
    }
    map
});

const NEUTRAL_SITE_HFA: f64 = 1.5;
const DEFAULT_HFA: f64 = 2.5;
const DENVER_HFA: f64 = 3.25;

const HFA_2_0: [&str; 4] = [
    "Las Vegas Raiders",
    "Jacksonville Jaguars",
    "Los Angeles Rams",
    "Los Angeles Chargers",
];

const HFA_3_0: [&str; 16] = [
    "Seattle Seahawks",
    "Cincinnati Bengals",
    "Baltimore Ravens",
    "Buffalo Bills",
    "Chicago Bears",
    "Dallas Cowboys",
    "Detroit Lions",
    "Green Bay Packers",
    "Kansas City Chiefs",
    "Miami Dolphins",
    "Minnesota Vikings",
    "New England Patriots",
    "Philadelphia Eagles",
    "Pittsburgh Steelers",
    "San Francisco 49ers",
    "Washington Commanders",
];

/// Resolves any alias, abbreviation or city to one canonical team key.
///
/// Unknown names are title-cased from their lookup key, so spellings that
/// differ only in case, spacing or periods agree.
pub fn canonical_team(input: &str) -> String {
    let key = lookup_key(input);
    match ALIAS_MAP.get(&key) {
        Some(team) => (*team).to_string(),
        None => title_case(&key),
    }
}

pub fn is_known_team(input: &str) -> bool {
    ALIAS_MAP.contains_key(&lookup_key(input))
}

/// Home-field advantage in points for the designated home team.
pub fn home_field_advantage(home_team: &str, neutral_site: bool) -> f64 {
    if neutral_site {
        return NEUTRAL_SITE_HFA;
    }
    let team = canonical_team(home_team);
    if team == "Denver Broncos" {
        DENVER_HFA
    } else if HFA_2_0.contains(&team.as_str()) {
        2.0
    } else if HFA_3_0.contains(&team.as_str()) {
        3.0
    } else {
        DEFAULT_HFA
    }
}

fn title_case(key: &str) -> String {
    key.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lookup_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per-team map whose keys are canonicalized once, on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, T>", into = "HashMap<String, T>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct TeamMap<T> {
    entries: HashMap<String, T>,
}

impl<T> TeamMap<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, team: &str, value: T) -> Option<T> {
        self.entries.insert(canonical_team(team), value)
    }

    pub fn get(&self, team: &str) -> Option<&T> {
        self.entries
            .get(team)
            .or_else(|| self.entries.get(&canonical_team(team)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<T> Default for TeamMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<HashMap<String, T>> for TeamMap<T> {
    fn from(raw: HashMap<String, T>) -> Self {
        raw.into_iter().collect()
    }
}

impl<T> From<TeamMap<T>> for HashMap<String, T> {
    fn from(map: TeamMap<T>) -> Self {
        map.entries
    }
}

impl<T, S: AsRef<str>> FromIterator<(S, T)> for TeamMap<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (team, value) in iter {
            map.insert(team.as_ref(), value);
        }
        map
    }
}
