//! The closed set of mission-script opcodes (spec §4.7). Grounded opcode
//! for opcode in `original_source/sandrock/structures/story_xml/stmt.py`'s
//! `Stmt` subclasses; unknown opcodes fall back to `StatementKind::Generic`
//! rather than failing the parse.

use std::collections::BTreeMap;

/// Raw `<STMT>` attributes, already `%XX`-decoded by `mission::xml`.
pub type Attrs = BTreeMap<String, String>;

fn attr_i64(attrs: &Attrs, key: &str) -> Option<i64> {
    attrs.get(key).and_then(|v| v.parse().ok())
}

fn attr_f64(attrs: &Attrs, key: &str) -> Option<f64> {
    attrs.get(key).and_then(|v| v.parse().ok())
}

fn attr_string(attrs: &Attrs, key: &str) -> Option<String> {
    attrs.get(key).cloned()
}

/// `a.get(k1) or a.get(k2)`: the original's own fallback idiom for
/// attributes that were renamed partway through the game's lifetime
/// (`stmt.py`'s `BagModify`/`BlueprintUnlock`/etc. constructors).
fn attr_i64_any(attrs: &Attrs, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| attr_i64(attrs, key))
}

/// `_compare_map` from `stmt.py`; two entries are hedged "(maybe?)" in the
/// original and are carried forward unchanged rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Ge,
    Eq,
    LeMaybe,
    GtMaybe,
    Lt,
    Unknown(i64),
}

impl Compare {
    fn from_raw(raw: i64) -> Compare {
        match raw {
            2 => Compare::Ge,
            3 => Compare::Eq,
            4 => Compare::LeMaybe,
            5 => Compare::GtMaybe,
            6 => Compare::Lt,
            other => Compare::Unknown(other),
        }
    }
}

/// `action_map` from `_StmtSetVar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarAction {
    Set,
    Increment,
    Decrement,
    Modulus,
    Unknown(i64),
}

impl VarAction {
    fn from_raw(raw: i64) -> VarAction {
        match raw {
            0 => VarAction::Set,
            1 => VarAction::Increment,
            2 => VarAction::Decrement,
            5 => VarAction::Modulus,
            other => VarAction::Unknown(other),
        }
    }
}

/// The closed statement catalog. Every variant keeps only the fields the
/// original's corresponding `Stmt` subclass actually reads.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Always,
    BagModify { add_remove: i64, count: i64, item_grade: i64, item_id: i64, show_tips: bool },
    BlueprintUnlock { item_id: i64, item_tag: i64, show_tips: bool },
    CheckEndScript { flag: i64, mission_id: i64, result: i64 },
    CheckMissionState { mission_id: i64, flag: i64, state: i64 },
    CheckNpcLeaveTown { flag: i64, npc_id: i64 },
    CheckNpcRelationship { compare: Compare, npc: i64, level: i64 },
    CheckVar { compare: Compare, name: String, reference: i64 },
    GlobalBlackBoardSet { key: String, info: String },
    MissionProgress { mission_id: i64 },
    NpcAddIdle { flag_name: String, look_at_npc_id: i64, npc_id: i64, order: i64, scene_name: String },
    NpcChangeFavor { favor: i64, npc_id: i64 },
    OnEveryDayStart,
    /// `_StmtQuiet`: camera/NPC-position statements with no resolver output.
    Quiet,
    ShowActorBubble { text_id: i64, npc_id: i64 },
    NpcSendGift { duration_hour: i64, gift_id: i64, npc_id: i64, scene_pos: String },
    OnConversationChoiceMade { option_id: String, conv_choice_index: i64, conv_segment_id: i64 },
    OnConversationEnd { c_id: i64, mission_id: i64, npc: i64, order: i64 },
    OnConversationEndSegment { c_id: i64, segment_id: i64, mission_id: i64, npc: i64, order: i64 },
    OnInteractWithNpc { npc: i64, order: i64 },
    OnPlayerWakeUp,
    OnSceneChange { from_scene: String, to_scene: String },
    RunMission { mission_id: Option<i64> },
    SendMail { mail_id: i64 },
    SetSpecialGiftRuleState { rule_id: i64, state: i64 },
    SetVar { name: String, scope: String, action: VarAction, value: f64 },
    ShowConversation { c_id: i64, dialogue_ids: Vec<i64> },
    StartInteractive { inst_id: i64, npc_id: i64, option_id: i64, kind: i64 },
    UpdateMissionInfo { desc: String, mission_id: i64, npc: i64, req_target: String, target_id: i64, title: String, kind: i64 },
    /// Anything outside the closed catalog; carries every raw attribute so
    /// downstream consumers can still inspect it (spec §4.7: "must not
    /// cause failure").
    Generic { opcode: String, attrs: Attrs },
}

impl StatementKind {
    /// `Stmt.find_stmt_class` collapsed into a single match over the
    /// closed opcode list.
    pub fn classify(opcode: &str, attrs: &Attrs) -> StatementKind {
        match opcode {
            "ALWAYS" => StatementKind::Always,

            "BAG ADD ITEM REPLACE" | "BAG MODIFY" => StatementKind::BagModify {
                add_remove: attr_i64(attrs, "addRemove").unwrap_or(0),
                count: attr_i64_any(attrs, &["count", "itemCount"]).unwrap_or(0),
                item_grade: attr_i64(attrs, "itemGrade").unwrap_or(0),
                item_id: attr_i64_any(attrs, &["item", "itemId"]).unwrap_or(0),
                show_tips: attr_i64_any(attrs, &["showTips", "itemShowTip"]).unwrap_or(0) != 0,
            },

            "BLUEPRINT UNLOCK" | "BLUEPRINT UNLOCK GROUP" => StatementKind::BlueprintUnlock {
                item_id: attr_i64(attrs, "id").unwrap_or(0),
                item_tag: attr_i64(attrs, "itemTag").unwrap_or(0),
                show_tips: attr_i64(attrs, "showTips").unwrap_or(0) != 0,
            },

            "CHECK END SCRIPT" => StatementKind::CheckEndScript {
                flag: attr_i64(attrs, "flag").unwrap_or(0),
                mission_id: attr_i64(attrs, "missionId").unwrap_or(0),
                result: attr_i64(attrs, "result").unwrap_or(0),
            },

            "CHECK MISSION CURRENT STATE" => StatementKind::CheckMissionState {
                mission_id: attr_i64(attrs, "missionId").unwrap_or(0),
                flag: attr_i64(attrs, "flag").unwrap_or(0),
                state: attr_i64(attrs, "state").unwrap_or(0),
            },

            "CHECK NPC LEAVE TOWN" => StatementKind::CheckNpcLeaveTown {
                flag: attr_i64(attrs, "flag").unwrap_or(0),
                npc_id: attr_i64(attrs, "npc").unwrap_or(0),
            },

            "CHECK PLAYER NPC RELATION SHIP" => StatementKind::CheckNpcRelationship {
                compare: Compare::from_raw(attr_i64(attrs, "compare").unwrap_or(0)),
                npc: attr_i64(attrs, "npc").unwrap_or(0),
                level: attr_i64(attrs, "level").unwrap_or(0),
            },

            "CHECK VAR" => StatementKind::CheckVar {
                compare: Compare::from_raw(attr_i64(attrs, "compare").unwrap_or(0)),
                name: attr_string(attrs, "name").unwrap_or_default(),
                reference: attr_i64(attrs, "ref").unwrap_or(0),
            },

            "GLOBAL BLACK BOARD SET" => StatementKind::GlobalBlackBoardSet {
                key: attr_string(attrs, "key").unwrap_or_default(),
                info: attr_string(attrs, "info").unwrap_or_default(),
            },

            "MISSION BEGIN" | "DELIVER MISSION" | "START MISSION" | "ON ACCEPT MISSION" | "ACTION MISSION TRACE"
            | "SUBMIT MISSION" | "END MISSION" | "MISSION END BEFORE" => {
                StatementKind::MissionProgress { mission_id: attr_i64(attrs, "missionId").unwrap_or(0) }
            }

            "NPC ADD IDLE" | "NPC ADD IDLE 2" => StatementKind::NpcAddIdle {
                flag_name: attr_string(attrs, "flagName").unwrap_or_default(),
                look_at_npc_id: attr_i64(attrs, "lookAtActor").unwrap_or(-1),
                npc_id: attr_i64(attrs, "npc").unwrap_or(0),
                order: attr_i64(attrs, "order").unwrap_or(-1),
                scene_name: attr_string(attrs, "sceneName").unwrap_or_default(),
            },

            "NPC CHANGE FAVOR" => StatementKind::NpcChangeFavor {
                favor: attr_i64(attrs, "changeFavor").unwrap_or(0),
                npc_id: attr_i64(attrs, "npc").unwrap_or(0),
            },

            "ON EVERY DAY START" => StatementKind::OnEveryDayStart,

            "CAMERA NATURAL SET" | "CAMERA PATH START" | "CAMERA PATH STOP" | "NPC CREATE SET POS ROT FLAG" => {
                StatementKind::Quiet
            }

            "SHOW ACTOR BUBBLE" => StatementKind::ShowActorBubble {
                text_id: attr_i64(attrs, "transId").unwrap_or(0),
                npc_id: attr_i64(attrs, "npc").unwrap_or(0),
            },

            "ACTION NPC SEND GIFT" => StatementKind::NpcSendGift {
                // `druationHour` is the real attribute name in game data, not a typo to fix.
                duration_hour: attr_i64(attrs, "druationHour").unwrap_or(0),
                gift_id: attr_i64(attrs, "giftId").unwrap_or(0),
                npc_id: attr_i64(attrs, "npc").unwrap_or(0),
                scene_pos: attr_string(attrs, "scenePos").unwrap_or_default(),
            },

            "ON CONVERSATION CHOICE MADE" => {
                let segment_id = attr_i64(attrs, "id").unwrap_or(0);
                let choice_index = attr_i64(attrs, "selectIndex").unwrap_or(0);
                StatementKind::OnConversationChoiceMade {
                    option_id: format!("{segment_id}_{choice_index}"),
                    conv_choice_index: choice_index,
                    conv_segment_id: segment_id,
                }
            }

            "ON CONVERSATION END" => StatementKind::OnConversationEnd {
                c_id: attr_i64(attrs, "cId").unwrap_or(0),
                mission_id: attr_i64(attrs, "missionId").unwrap_or(0),
                npc: attr_i64(attrs, "npc").unwrap_or(0),
                order: attr_i64(attrs, "order").unwrap_or(0),
            },

            "ON CONVERSATION END SEGMENT" => StatementKind::OnConversationEndSegment {
                c_id: attr_i64(attrs, "cId").unwrap_or(0),
                segment_id: attr_i64(attrs, "id").unwrap_or(0),
                mission_id: attr_i64(attrs, "missionId").unwrap_or(0),
                npc: attr_i64(attrs, "npc").unwrap_or(0),
                order: attr_i64(attrs, "order").unwrap_or(0),
            },

            "ON INTERACT WITH NPC" => StatementKind::OnInteractWithNpc {
                npc: attr_i64(attrs, "npc").unwrap_or(0),
                order: attr_i64(attrs, "order").unwrap_or(0),
            },

            "ON PLAYER WAKE UP" => StatementKind::OnPlayerWakeUp,

            "ON SCENE CHANGE END" | "ON SCENE CHANGE POST" | "ON SCENE CHANGE START" => StatementKind::OnSceneChange {
                from_scene: attr_string(attrs, "fromScene").unwrap_or_default(),
                to_scene: attr_string(attrs, "toScene").unwrap_or_default(),
            },

            "RUN MISSION" => StatementKind::RunMission { mission_id: attr_i64(attrs, "missionId") },

            "MAIL SEND TO BOX" => StatementKind::SendMail { mail_id: attr_i64(attrs, "mailId").unwrap_or(0) },

            "SET SPECIAL GIFT RULE STATE" => StatementKind::SetSpecialGiftRuleState {
                rule_id: attr_i64(attrs, "ruleID").unwrap_or(0),
                state: attr_i64(attrs, "state").unwrap_or(0),
            },

            "SET VAR" => StatementKind::SetVar {
                name: attr_string(attrs, "name").unwrap_or_default(),
                scope: attr_string(attrs, "scope").unwrap_or_default(),
                action: VarAction::from_raw(attr_i64(attrs, "set").unwrap_or(0)),
                value: attr_f64(attrs, "value").unwrap_or(0.0),
            },

            "SHOW CONVERSATION" | "SHOW CONVERSATION CACHED" => StatementKind::ShowConversation {
                c_id: attr_i64(attrs, "cId").unwrap_or(0),
                dialogue_ids: attr_string(attrs, "dialog")
                    .unwrap_or_default()
                    .split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect(),
            },

            "START INTERACTIVE" => StatementKind::StartInteractive {
                inst_id: attr_i64(attrs, "instId").unwrap_or(0),
                npc_id: attr_i64(attrs, "protoId").unwrap_or(0),
                option_id: attr_i64(attrs, "optionId").unwrap_or(0),
                kind: attr_i64(attrs, "type").unwrap_or(0),
            },

            "UPDATE MISSION INFO" => StatementKind::UpdateMissionInfo {
                desc: attr_string(attrs, "desc").unwrap_or_default(),
                mission_id: attr_i64(attrs, "missionId").unwrap_or(0),
                npc: attr_i64(attrs, "npc").unwrap_or(0),
                req_target: attr_string(attrs, "reqTarget").unwrap_or_default(),
                target_id: attr_i64(attrs, "targetId").unwrap_or(0),
                title: attr_string(attrs, "title").unwrap_or_default(),
                kind: attr_i64(attrs, "type").unwrap_or(0),
            },

            other => StatementKind::Generic { opcode: other.to_string(), attrs: attrs.clone() },
        }
    }
}

impl StatementKind {
    /// *receive-item*: BAG MODIFY / BAG ADD ITEM REPLACE with
    /// `add_remove == 0`.
    pub fn as_received_item(&self) -> Option<(i64, i64)> {
        match self {
            StatementKind::BagModify { add_remove: 0, item_id, count, .. } => Some((*item_id, *count)),
            _ => None,
        }
    }

    /// *check-mission-state*, only the named `state=3, flag=1` case (Open
    /// Question #2: the original's `is_failed` guess is not carried
    /// forward).
    pub fn is_successfully_completed_mission(&self) -> Option<i64> {
        match self {
            StatementKind::CheckMissionState { mission_id, flag: 1, state: 3 } => Some(*mission_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attrs {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn bag_modify_with_add_remove_zero_is_a_received_item() {
        let stmt = StatementKind::classify("BAG MODIFY", &attrs(&[("addRemove", "0"), ("item", "100"), ("count", "3")]));
        assert_eq!(stmt.as_received_item(), Some((100, 3)));
    }

    #[test]
    fn bag_modify_with_add_remove_one_is_not_a_received_item() {
        let stmt = StatementKind::classify("BAG MODIFY", &attrs(&[("addRemove", "1"), ("item", "100"), ("count", "3")]));
        assert_eq!(stmt.as_received_item(), None);
    }

    #[test]
    fn bag_modify_falls_back_to_secondary_attribute_names() {
        let stmt = StatementKind::classify("BAG MODIFY", &attrs(&[("addRemove", "0"), ("itemId", "100"), ("itemCount", "3"), ("itemShowTip", "1")]));
        assert_eq!(stmt.as_received_item(), Some((100, 3)));
        assert_eq!(stmt, StatementKind::BagModify { add_remove: 0, count: 3, item_grade: 0, item_id: 100, show_tips: true });
    }

    #[test]
    fn unknown_opcode_falls_back_to_generic() {
        let stmt = StatementKind::classify("SOME FUTURE OPCODE", &attrs(&[("x", "1")]));
        assert!(matches!(stmt, StatementKind::Generic { .. }));
    }

    #[test]
    fn check_mission_state_names_only_the_success_case() {
        let success = StatementKind::classify("CHECK MISSION CURRENT STATE", &attrs(&[("missionId", "5"), ("flag", "1"), ("state", "3")]));
        assert_eq!(success.is_successfully_completed_mission(), Some(5));

        let other = StatementKind::classify("CHECK MISSION CURRENT STATE", &attrs(&[("missionId", "5"), ("flag", "1"), ("state", "4")]));
        assert_eq!(other.is_successfully_completed_mission(), None);
    }

    #[test]
    fn run_mission_reads_camel_case_mission_id() {
        let stmt = StatementKind::classify("RUN MISSION", &attrs(&[("missionId", "42")]));
        assert_eq!(stmt, StatementKind::RunMission { mission_id: Some(42) });
    }

    #[test]
    fn show_conversation_parses_comma_separated_dialogue_ids() {
        let stmt = StatementKind::classify("SHOW CONVERSATION", &attrs(&[("cId", "9"), ("dialog", "1,2,3")]));
        assert_eq!(stmt, StatementKind::ShowConversation { c_id: 9, dialogue_ids: vec![1, 2, 3] });
    }

    #[test]
    fn conversation_choice_made_derives_composite_option_id() {
        let stmt = StatementKind::classify("ON CONVERSATION CHOICE MADE", &attrs(&[("id", "7"), ("selectIndex", "2")]));
        assert_eq!(stmt, StatementKind::OnConversationChoiceMade { option_id: "7_2".to_string(), conv_choice_index: 2, conv_segment_id: 7 });
    }

    #[test]
    fn npc_send_gift_reads_the_verbatim_typo_duration_attribute() {
        let stmt = StatementKind::classify(
            "ACTION NPC SEND GIFT",
            &attrs(&[("giftId", "3"), ("npc", "10"), ("scenePos", "1|2|3"), ("druationHour", "6")]),
        );
        assert_eq!(
            stmt,
            StatementKind::NpcSendGift { duration_hour: 6, gift_id: 3, npc_id: 10, scene_pos: "1|2|3".to_string() }
        );
    }
}
