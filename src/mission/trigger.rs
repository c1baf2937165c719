//! `Trigger` (spec §3, §4.7): one `(procedure, step, order)` unit of a
//! mission, holding classified EVENTS/CONDITIONS/ACTIONS. Accessor methods
//! grounded verbatim in
//! `original_source/sandrock/structures/story_xml/trigger.py`.

use crate::mission::statement::StatementKind;
use crate::mission::xml::RawTrigger;

#[derive(Debug, Clone)]
pub struct Trigger {
    pub procedure: f64,
    pub step: f64,
    pub repeat: i64,
    pub order: i64,
    pub events: Vec<StatementKind>,
    pub conditions: Vec<StatementKind>,
    pub actions: Vec<StatementKind>,
}

impl Trigger {
    pub fn from_raw(raw: &RawTrigger, order: i64) -> Trigger {
        Trigger {
            procedure: raw.procedure,
            step: raw.step,
            repeat: raw.repeat,
            order,
            events: raw.events.iter().map(|s| StatementKind::classify(&s.opcode, &s.attrs)).collect(),
            conditions: raw.conditions.iter().map(|s| StatementKind::classify(&s.opcode, &s.attrs)).collect(),
            actions: raw.actions.iter().map(|s| StatementKind::classify(&s.opcode, &s.attrs)).collect(),
        }
    }

    /// `Trigger.is_quiet`: every action is a no-output statement.
    pub fn is_quiet(&self) -> bool {
        self.actions.iter().all(|a| matches!(a, StatementKind::Quiet))
    }

    /// `Trigger.ended_conversation_c_id`.
    pub fn ended_conversation_c_id(&self) -> Option<i64> {
        self.events.iter().find_map(|e| match e {
            StatementKind::OnConversationEnd { c_id, .. } => Some(*c_id),
            _ => None,
        })
    }

    /// `Trigger.started_conversation_c_id`.
    pub fn started_conversation_c_id(&self) -> Option<i64> {
        self.actions.iter().find_map(|a| match a {
            StatementKind::ShowConversation { c_id, .. } => Some(*c_id),
            _ => None,
        })
    }

    /// `Trigger.get_unlocked_item_ids`.
    pub fn unlocked_item_ids(&self) -> Vec<i64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                StatementKind::BlueprintUnlock { item_id, .. } => Some(*item_id),
                _ => None,
            })
            .collect()
    }

    /// `Trigger.get_received_gifts`'s inner gift-id list.
    pub fn gift_ids(&self) -> Vec<i64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                StatementKind::NpcSendGift { gift_id, .. } => Some(*gift_id),
                _ => None,
            })
            .collect()
    }

    /// `Trigger.get_mail_id_by_mission_id`'s inner mail-id list.
    pub fn mail_ids(&self) -> Vec<i64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                StatementKind::SendMail { mail_id } => Some(*mail_id),
                _ => None,
            })
            .collect()
    }

    /// `Trigger.get_received_items`'s inner `(item_id, count)` list.
    pub fn received_items(&self) -> Vec<(i64, i64)> {
        self.actions.iter().filter_map(StatementKind::as_received_item).collect()
    }

    /// Every `CHECK MISSION CURRENT STATE` condition naming a successfully
    /// completed mission (`is_successfully_completed`, Open Question #2).
    pub fn successfully_completed_mission_conditions(&self) -> Vec<i64> {
        self.conditions.iter().filter_map(StatementKind::is_successfully_completed_mission).collect()
    }

    /// Every `CHECK PLAYER NPC RELATION SHIP` condition's `(npc, level)`.
    pub fn relationship_conditions(&self) -> Vec<(i64, i64)> {
        self.conditions
            .iter()
            .filter_map(|c| match c {
                StatementKind::CheckNpcRelationship { npc, level, .. } => Some((*npc, *level)),
                _ => None,
            })
            .collect()
    }

    /// True when the only condition is `ALWAYS` (used by `get_received_items`
    /// to decide whether `ON CONVERSATION END` events count as a causal
    /// event).
    pub fn conditions_are_only_always(&self) -> bool {
        self.conditions.len() == 1 && matches!(self.conditions[0], StatementKind::Always)
    }

    /// Every `npc` on an `ON CONVERSATION END` event, used alongside
    /// `conditions_are_only_always` to build the `('npc','conversation',npc)`
    /// causal event.
    pub fn conversation_end_npcs(&self) -> Vec<i64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StatementKind::OnConversationEnd { npc, .. } => Some(*npc),
                _ => None,
            })
            .collect()
    }
}
