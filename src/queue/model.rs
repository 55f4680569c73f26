//! Pickup queue entity and its pure membership logic
//!
//! This module contains the queue data model and the in-memory state
//! transitions for joining, leaving, and team formation. It performs no
//! I/O; persistence and side effects live in [`crate::queue::service`].

use crate::error::Result;
use crate::flags::FlagSet;
use crate::types::{GuildId, MessageId, Subscriber, Team, UserId};
use crate::utils::{current_timestamp, queue_key};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Smallest allowed team size
pub const MIN_TEAM_SIZE: u32 = 1;
/// Largest allowed team size
pub const MAX_TEAM_SIZE: u32 = 16;
/// Team size used when none is given
pub const DEFAULT_TEAM_SIZE: u32 = 4;

/// Possible states of a pickup queue.
///
/// There is no closed state; deletion removes the record instead of
/// transitioning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    /// Accepting subscribers into open slots
    Open,
    /// Every slot is taken, new joins land on the waiting list
    Full,
    /// Teams are formed and the match is underway
    Started,
}

/// Outcome of a join attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// User took an open subscriber slot
    Subscribed,
    /// Queue was full or started, user appended to the waiting list
    Waitlisted,
    /// User already held a slot or a waiting list position
    AlreadyMember,
}

/// Outcome of a leave attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// User was removed; if a waiting user was promoted into the freed
    /// slot they are carried here
    Left { promoted: Option<Subscriber> },
    /// User held neither a slot nor a waiting list position
    NotMember,
}

/// A named, per-guild roster of players waiting to start a match.
///
/// Identity is `(guild_id, name lowercased)`; once rendered the queue is
/// also addressable by its static message id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupQueue {
    pub guild_id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub owner_name: String,
    pub team_size: u32,
    pub is_coop: bool,
    pub rcon_enabled: bool,
    pub host: Option<String>,
    pub port: u16,
    pub games: Vec<String>,
    pub subscribers: Vec<Subscriber>,
    pub waiting_list: VecDeque<Subscriber>,
    pub teams: Vec<Team>,
    pub started: bool,
    pub static_message_id: Option<MessageId>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl PickupQueue {
    /// Create a new queue with the creator as sole subscriber
    pub fn new(
        guild_id: GuildId,
        name: impl Into<String>,
        owner: Subscriber,
        team_size: Option<u32>,
        flags: &FlagSet,
    ) -> Self {
        let now = current_timestamp();
        let team_size = flags
            .team_size
            .or(team_size)
            .unwrap_or(DEFAULT_TEAM_SIZE)
            .clamp(MIN_TEAM_SIZE, MAX_TEAM_SIZE);

        Self {
            guild_id,
            name: name.into(),
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            team_size,
            is_coop: flags.coop.unwrap_or(false),
            rcon_enabled: flags.rcon.unwrap_or(true),
            host: flags.host.clone(),
            port: flags.port.unwrap_or(0),
            games: flags.games.clone().unwrap_or_default(),
            subscribers: vec![owner],
            waiting_list: VecDeque::new(),
            teams: Vec::new(),
            started: false,
            static_message_id: None,
            created: now,
            updated: now,
        }
    }

    /// Row key within the guild
    pub fn key(&self) -> String {
        queue_key(&self.name)
    }

    /// Total subscriber slots: one team for coop, two otherwise
    pub fn max_in_queue(&self) -> u32 {
        self.team_size * if self.is_coop { 1 } else { 2 }
    }

    /// Fill ratio used only for display ordering, descending
    pub fn readiness(&self) -> f64 {
        self.subscribers.len() as f64 / self.max_in_queue() as f64
    }

    pub fn state(&self) -> QueueState {
        if self.started {
            QueueState::Started
        } else if self.subscribers.len() as u32 >= self.max_in_queue() {
            QueueState::Full
        } else {
            QueueState::Open
        }
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.subscribers.iter().any(|s| s.id == user_id)
            || self.waiting_list.iter().any(|s| s.id == user_id)
    }

    /// Add a user to the roster, or to the waiting list when no slot is
    /// open. Idempotent per user: re-joining is a no-op.
    pub fn join(&mut self, subscriber: Subscriber) -> JoinOutcome {
        if self.is_member(subscriber.id) {
            return JoinOutcome::AlreadyMember;
        }

        let outcome = match self.state() {
            QueueState::Open => {
                self.subscribers.push(subscriber);
                JoinOutcome::Subscribed
            }
            QueueState::Full | QueueState::Started => {
                self.waiting_list.push_back(subscriber);
                JoinOutcome::Waitlisted
            }
        };

        self.touch();
        outcome
    }

    /// Remove a user from whichever of the roster or waiting list holds
    /// them. A freed slot is refilled from the head of the waiting list,
    /// but only before the match has started; once started, waiting
    /// users never auto-join active play.
    pub fn leave(&mut self, user_id: UserId) -> LeaveOutcome {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != user_id);
        let left_roster = self.subscribers.len() < before;

        if !left_roster {
            let before = self.waiting_list.len();
            self.waiting_list.retain(|s| s.id != user_id);
            if self.waiting_list.len() == before {
                return LeaveOutcome::NotMember;
            }
            self.touch();
            return LeaveOutcome::Left { promoted: None };
        }

        let promoted = if !self.started {
            self.waiting_list.pop_front().map(|next| {
                self.subscribers.push(next.clone());
                next
            })
        } else {
            None
        };

        self.touch();
        LeaveOutcome::Left { promoted }
    }

    /// True when nobody is left in the roster or the waiting list
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty() && self.waiting_list.is_empty()
    }

    /// Overwrite only the fields the flag set actually mentions
    pub fn apply_flags(&mut self, flags: &FlagSet) {
        if let Some(team_size) = flags.team_size {
            self.team_size = team_size.clamp(MIN_TEAM_SIZE, MAX_TEAM_SIZE);
        }
        if let Some(coop) = flags.coop {
            self.is_coop = coop;
        }
        if let Some(rcon) = flags.rcon {
            self.rcon_enabled = rcon;
        }
        if let Some(host) = &flags.host {
            self.host = Some(host.clone());
        }
        if let Some(port) = flags.port {
            self.port = port;
        }
        if let Some(games) = &flags.games {
            self.games = games.clone();
        }
        self.touch();
    }

    /// Shuffle the roster uniformly and split it into two contiguous
    /// halves of `ceil(n/2)` and the remainder. Coop queues keep the
    /// whole shuffled roster in the first half.
    pub fn partition_subscribers<R: Rng>(&self, rng: &mut R) -> (Vec<Subscriber>, Vec<Subscriber>) {
        let mut shuffled = self.subscribers.clone();
        shuffled.shuffle(rng);

        if self.is_coop {
            return (shuffled, Vec::new());
        }

        let half = shuffled.len().div_ceil(2);
        let second = shuffled.split_off(half);
        (shuffled, second)
    }

    /// Install the formed teams and mark the queue as started
    pub fn start_with_teams(&mut self, teams: Vec<Team>) -> Result<()> {
        self.teams = teams;
        self.started = true;
        self.touch();
        Ok(())
    }

    /// Clear teams and return to the not-started state
    pub fn reset(&mut self) {
        self.teams.clear();
        self.started = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated = current_timestamp();
    }
}
