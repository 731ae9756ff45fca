use std::fmt;
use std::str::FromStr;

use crate::core::constants::SELECTED_VESSEL_PARAM;

/// Query string of a shareable map link.
///
/// Only `selectedVessel` is interpreted; every other parameter is kept in
/// its original order and rendered back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareableLink {
    params: Vec<(String, String)>,
}

impl ShareableLink {
    /// Parses `?a=1&selectedVessel=244660000`; the leading `?` is optional
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();
        Self { params }
    }

    /// Selected vessel id, ignoring an empty value
    pub fn selected_vessel(&self) -> Option<&str> {
        self.get(SELECTED_VESSEL_PARAM).filter(|id| !id.trim().is_empty())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or clears the selected vessel
    pub fn set_selected_vessel(&mut self, id: Option<&str>) {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => match self.params.iter_mut().find(|(k, _)| k == SELECTED_VESSEL_PARAM) {
                Some((_, v)) => *v = id.to_string(),
                None => self
                    .params
                    .push((SELECTED_VESSEL_PARAM.to_string(), id.to_string())),
            },
            None => self.params.retain(|(k, _)| k != SELECTED_VESSEL_PARAM),
        }
    }

    pub fn with_selected_vessel(mut self, id: Option<&str>) -> Self {
        self.set_selected_vessel(id);
        self
    }

    /// Rendered query including the leading `?`, empty when no parameters
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let joined = self
            .params
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    }
}

impl fmt::Display for ShareableLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl FromStr for ShareableLink {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
