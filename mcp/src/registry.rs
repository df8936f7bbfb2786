//! Static tool registry.
//!
//! Every tool the adapter exposes is a variant of [`Tool`] and has exactly
//! one entry in [`TOOLS`]. The table is ordered (Sonarr first, then Radarr)
//! and never changes at runtime.

use serde_json::{json, Map, Value};

use crate::config::Service;
use crate::tools::ToolError;

/// Identifies a tool independently of its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    SonarrRecentSeries,
    SonarrCalendar,
    SonarrSearchSeries,
    SonarrSystemStatus,
    SonarrQueue,
    SonarrRefreshSeries,
    SonarrSearchEpisodes,
    RadarrRecentMovies,
    RadarrCalendar,
    RadarrSearchMovies,
    RadarrSystemStatus,
    RadarrQueue,
    RadarrRefreshMovie,
    RadarrSearchMovie,
}

/// JSON Schema type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    String,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
        }
    }
}

/// One named parameter of a tool's input schema.
#[derive(Debug)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
    pub default: Option<u32>,
}

/// Name, description and input schema of a tool.
#[derive(Debug)]
pub struct ToolDefinition {
    pub tool: Tool,
    pub service: Service,
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
}

impl ToolDefinition {
    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&'static Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// MCP tool descriptor: `{name, description, inputSchema}`.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for p in self.params {
            let mut prop = json!({
                "type": p.ty.as_str(),
                "description": p.description,
            });
            if let Some(default) = p.default {
                prop["default"] = json!(default);
            }
            if p.ty == ParamType::Integer {
                prop["minimum"] = json!(1);
            }
            properties.insert(p.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": schema
        })
    }
}

const fn days(default: u32, description: &'static str) -> Param {
    Param {
        name: "days",
        ty: ParamType::Integer,
        required: false,
        description,
        default: Some(default),
    }
}

const QUERY_SERIES: Param = Param {
    name: "query",
    ty: ParamType::String,
    required: true,
    description: "Search query (series title)",
    default: None,
};

const QUERY_MOVIES: Param = Param {
    name: "query",
    ty: ParamType::String,
    required: true,
    description: "Search query (movie title)",
    default: None,
};

const fn id(name: &'static str, description: &'static str) -> Param {
    Param {
        name,
        ty: ParamType::Integer,
        required: true,
        description,
        default: None,
    }
}

/// All tools, in display order.
pub static TOOLS: [ToolDefinition; 14] = [
    ToolDefinition {
        tool: Tool::SonarrRecentSeries,
        service: Service::Sonarr,
        name: "sonarr_get_recent_series",
        description: "Get recently added TV series from Sonarr. Returns series added in the last N days (default 7).",
        params: &[days(7, "Number of days to look back (default: 7)")],
    },
    ToolDefinition {
        tool: Tool::SonarrCalendar,
        service: Service::Sonarr,
        name: "sonarr_get_calendar",
        description: "Get upcoming episodes from the Sonarr calendar. Shows episodes airing in the next N days (default 7).",
        params: &[days(7, "Number of days to look ahead (default: 7)")],
    },
    ToolDefinition {
        tool: Tool::SonarrSearchSeries,
        service: Service::Sonarr,
        name: "sonarr_search_series",
        description: "Search for a TV series in Sonarr's library by title.",
        params: &[QUERY_SERIES],
    },
    ToolDefinition {
        tool: Tool::SonarrSystemStatus,
        service: Service::Sonarr,
        name: "sonarr_get_system_status",
        description: "Get Sonarr system status including version, runtime and disk space.",
        params: &[],
    },
    ToolDefinition {
        tool: Tool::SonarrQueue,
        service: Service::Sonarr,
        name: "sonarr_get_queue",
        description: "Get the current download queue in Sonarr.",
        params: &[],
    },
    ToolDefinition {
        tool: Tool::SonarrRefreshSeries,
        service: Service::Sonarr,
        name: "sonarr_refresh_series",
        description: "Trigger a refresh of a specific series to update metadata and check for new episodes.",
        params: &[id("series_id", "ID of the series to refresh")],
    },
    ToolDefinition {
        tool: Tool::SonarrSearchEpisodes,
        service: Service::Sonarr,
        name: "sonarr_search_episodes",
        description: "Trigger a search for missing episodes of a specific series.",
        params: &[id("series_id", "ID of the series to search episodes for")],
    },
    ToolDefinition {
        tool: Tool::RadarrRecentMovies,
        service: Service::Radarr,
        name: "radarr_get_recent_movies",
        description: "Get recently added movies from Radarr. Returns movies added in the last N days (default 7).",
        params: &[days(7, "Number of days to look back (default: 7)")],
    },
    ToolDefinition {
        tool: Tool::RadarrCalendar,
        service: Service::Radarr,
        name: "radarr_get_calendar",
        description: "Get upcoming movie releases from the Radarr calendar (default 30 days).",
        params: &[days(30, "Number of days to look ahead (default: 30)")],
    },
    ToolDefinition {
        tool: Tool::RadarrSearchMovies,
        service: Service::Radarr,
        name: "radarr_search_movies",
        description: "Search for a movie in Radarr's library by title.",
        params: &[QUERY_MOVIES],
    },
    ToolDefinition {
        tool: Tool::RadarrSystemStatus,
        service: Service::Radarr,
        name: "radarr_get_system_status",
        description: "Get Radarr system status including version, runtime and disk space.",
        params: &[],
    },
    ToolDefinition {
        tool: Tool::RadarrQueue,
        service: Service::Radarr,
        name: "radarr_get_queue",
        description: "Get the current download queue in Radarr.",
        params: &[],
    },
    ToolDefinition {
        tool: Tool::RadarrRefreshMovie,
        service: Service::Radarr,
        name: "radarr_refresh_movie",
        description: "Trigger a refresh of a specific movie to update metadata.",
        params: &[id("movie_id", "ID of the movie to refresh")],
    },
    ToolDefinition {
        tool: Tool::RadarrSearchMovie,
        service: Service::Radarr,
        name: "radarr_search_movie",
        description: "Trigger a search for a specific movie.",
        params: &[id("movie_id", "ID of the movie to search for")],
    },
];

/// All tool definitions in stable display order.
pub fn list_tools() -> &'static [ToolDefinition] {
    &TOOLS
}

/// Resolve a tool name to its definition.
pub fn lookup(name: &str) -> Result<&'static ToolDefinition, ToolError> {
    TOOLS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_tool_has_one_entry() {
        let tools: HashSet<Tool> = TOOLS.iter().map(|d| d.tool).collect();
        let names: HashSet<&str> = TOOLS.iter().map(|d| d.name).collect();
        assert_eq!(tools.len(), TOOLS.len());
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn names_follow_service_prefix() {
        for def in list_tools() {
            assert!(
                def.name.starts_with(&format!("{}_", def.service.id())),
                "{} is not prefixed with its service",
                def.name
            );
        }
        let sonarr = TOOLS.iter().filter(|d| d.service == Service::Sonarr).count();
        assert_eq!(sonarr, 7);
    }

    #[test]
    fn lookup_known_and_unknown() {
        for def in list_tools() {
            assert_eq!(lookup(def.name).unwrap().tool, def.tool);
        }
        assert!(matches!(
            lookup("sonarr_delete_everything"),
            Err(ToolError::UnknownTool(name)) if name == "sonarr_delete_everything"
        ));
    }

    #[test]
    fn schema_lists_required_params() {
        let def = lookup("radarr_search_movies").unwrap();
        let json = def.to_json();
        assert_eq!(json["name"], "radarr_search_movies");
        assert_eq!(json["inputSchema"]["required"], json!(["query"]));
        assert_eq!(json["inputSchema"]["properties"]["query"]["type"], "string");

        let calendar = lookup("radarr_get_calendar").unwrap().to_json();
        assert_eq!(calendar["inputSchema"]["properties"]["days"]["default"], 30);
        assert!(calendar["inputSchema"].get("required").is_none());
    }
}
