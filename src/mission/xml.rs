//! Mission XML parsing (spec §4.7, §6). Grounded in
//! `original_source/sandrock/structures/story_xml/{trigger.py,stmt.py}` and
//! `structures/story.py`'s XML root shape
//! (`<mission id isMain nameId properties>`). Attribute values are `%XX`
//! url-encoded in the source files and must be recursively decoded before
//! use.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::AtlasError;
use crate::mission::statement::Attrs;

/// One `<STMT stmt="OPCODE" .../>` element, attributes already decoded.
#[derive(Debug, Clone)]
pub struct RawStmt {
    pub opcode: String,
    pub attrs: Attrs,
}

/// One `<TRIGGER procedure repeat step>` element in appearance order.
#[derive(Debug, Clone, Default)]
pub struct RawTrigger {
    pub procedure: f64,
    pub repeat: i64,
    pub step: f64,
    pub events: Vec<RawStmt>,
    pub conditions: Vec<RawStmt>,
    pub actions: Vec<RawStmt>,
}

/// The whole parsed `<mission>` document.
#[derive(Debug, Clone, Default)]
pub struct RawMission {
    pub id: i64,
    pub is_main: bool,
    pub name_id: i64,
    /// Raw `|`-split `properties` attribute, parsed as integers.
    pub properties: Vec<i64>,
    pub triggers: Vec<RawTrigger>,
}

/// Decodes `%XX` escapes, repeating until the text is stable or a small
/// iteration cap is hit — `urllib.parse.unquote` is itself idempotent once
/// no `%XX` sequences remain, but source attributes are sometimes
/// double-encoded (`trigger.py`'s script-name handling hits the same
/// case), so a handful of passes matches the original's effective
/// behavior without looping forever on pathological input.
pub fn decode_recursive(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..5 {
        let decoded = percent_encoding::percent_decode_str(&current).decode_utf8_lossy().to_string();
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

fn attr_value(attr: &quick_xml::events::attributes::Attribute, decode: bool) -> Result<String, String> {
    let raw = attr.unescape_value().map_err(|e| e.to_string())?.to_string();
    Ok(if decode { decode_recursive(&raw) } else { raw })
}

fn read_attrs(e: &quick_xml::events::BytesStart) -> Result<Attrs, String> {
    let mut attrs = Attrs::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr_value(&attr, true)?;
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn attr_i64(attrs: &Attrs, key: &str) -> i64 {
    attrs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn attr_f64(attrs: &Attrs, key: &str) -> f64 {
    attrs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

fn attr_bool(attrs: &Attrs, key: &str) -> bool {
    attrs.get(key).map(|v| v.eq_ignore_ascii_case("true") || v == "1").unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Events,
    Conditions,
    Actions,
}

/// Parses one mission's whole XML document into its raw structure.
/// Unknown elements besides `mission`/`TRIGGER`/`EVENTS`/`CONDITIONS`/
/// `ACTIONS`/`STMT` are ignored, matching spec §4.7's "fall back, must not
/// cause failure" contract for unrecognized shapes.
pub fn parse_mission_xml(text: &str) -> Result<RawMission, AtlasError> {
    parse_mission_xml_str(text).map_err(|message| AtlasError::ParseError { path: "<mission script>".into(), message })
}

fn parse_mission_xml_str(text: &str) -> Result<RawMission, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut mission = RawMission::default();
    let mut current_trigger: Option<RawTrigger> = None;
    let mut section = Section::None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let attrs = read_attrs(&e)?;
                match tag.as_str() {
                    "mission" => {
                        mission.id = attr_i64(&attrs, "id");
                        mission.is_main = attr_bool(&attrs, "isMain");
                        mission.name_id = attr_i64(&attrs, "nameId");
                        mission.properties = attrs
                            .get("properties")
                            .map(|v| v.split('|').map(|s| s.trim().parse::<i64>().unwrap_or(0)).collect())
                            .unwrap_or_default();
                    }
                    "TRIGGER" => {
                        current_trigger = Some(RawTrigger {
                            procedure: attr_f64(&attrs, "procedure"),
                            repeat: attr_i64(&attrs, "repeat"),
                            step: attr_f64(&attrs, "step"),
                            ..RawTrigger::default()
                        });
                    }
                    "EVENTS" => section = Section::Events,
                    "CONDITIONS" => section = Section::Conditions,
                    "ACTIONS" => section = Section::Actions,
                    "STMT" => {
                        let opcode = attrs.get("stmt").cloned().unwrap_or_default();
                        let stmt = RawStmt { opcode, attrs };
                        if let Some(trigger) = current_trigger.as_mut() {
                            match section {
                                Section::Events => trigger.events.push(stmt),
                                Section::Conditions => trigger.conditions.push(stmt),
                                Section::Actions => trigger.actions.push(stmt),
                                Section::None => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "EVENTS" | "CONDITIONS" | "ACTIONS" => section = Section::None,
                    "TRIGGER" => {
                        if let Some(trigger) = current_trigger.take() {
                            mission.triggers.push(trigger);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    // Order of appearance, 1-based, matching `Trigger.__init__`'s `order`
    // parameter (passed in by whatever builds the Trigger list).
    Ok(mission)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<mission id="5" isMain="true" nameId="900" properties="-1|0|0|0">
        <TRIGGER procedure="1" repeat="0" step="0">
            <EVENTS><STMT stmt="ON EVERY DAY START"/></EVENTS>
            <CONDITIONS><STMT stmt="ALWAYS"/></CONDITIONS>
            <ACTIONS><STMT stmt="BAG%20MODIFY" addRemove="0" itemId="100" count="3"/></ACTIONS>
        </TRIGGER>
    </mission>"#;

    #[test]
    fn parses_mission_attributes_and_properties() {
        let mission = parse_mission_xml(SAMPLE).unwrap();
        assert_eq!(mission.id, 5);
        assert!(mission.is_main);
        assert_eq!(mission.name_id, 900);
        assert_eq!(mission.properties, vec![-1, 0, 0, 0]);
    }

    #[test]
    fn parses_one_trigger_with_three_sections() {
        let mission = parse_mission_xml(SAMPLE).unwrap();
        assert_eq!(mission.triggers.len(), 1);
        let trigger = &mission.triggers[0];
        assert_eq!(trigger.events.len(), 1);
        assert_eq!(trigger.conditions.len(), 1);
        assert_eq!(trigger.actions.len(), 1);
        assert_eq!(trigger.actions[0].opcode, "BAG MODIFY");
    }

    #[test]
    fn decode_recursive_handles_percent_escapes() {
        assert_eq!(decode_recursive("a%20b"), "a b");
        assert_eq!(decode_recursive("no escapes here"), "no escapes here");
    }
}
