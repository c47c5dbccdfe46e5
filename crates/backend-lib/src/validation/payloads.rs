//! Constraint tables for every request payload.

use std::collections::HashSet;

use social_common::{
    AlbumCreate, CommentCreate, DiscussionCreate, EventConfig, EventCreate, EventUpdate,
    GroupCreate, GroupUpdate, LoginRequest, MessageCreate, PhotoCreate, PollCreate,
    ShoppingItemCreate, ShoppingItemUpdate, TicketPurchase, TicketTypeCreate, UserCreate,
    UserUpdate, VoteCreate,
};

use super::{field, normalize_email, FieldRules, Rule, Validate, ValidationErrors};

const fn len(min: usize, max: usize) -> Rule {
    Rule::Length { min, max }
}

const REQUIRED_ID: &[Rule] = &[Rule::Required, len(1, 128)];

impl Validate for UserCreate {
    const RULES: &'static [FieldRules] = &[
        field("email", &[Rule::Required, Rule::Email]),
        field("username", &[Rule::Required, len(3, 50)]),
        field("password", &[Rule::Required, len(8, 72)]),
        field("first_name", &[len(0, 100)]),
        field("last_name", &[len(0, 100)]),
        field("profile_picture", &[Rule::Url]),
    ];

    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
        self.username = self.username.trim().to_string();
    }
}

impl Validate for UserUpdate {
    const RULES: &'static [FieldRules] = &[
        field("email", &[Rule::Email]),
        field("username", &[len(3, 50)]),
        field("password", &[len(8, 72)]),
        field("first_name", &[len(0, 100)]),
        field("last_name", &[len(0, 100)]),
        field("profile_picture", &[Rule::Url]),
    ];

    fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
        }
        if let Some(username) = self.username.as_mut() {
            *username = username.trim().to_string();
        }
    }
}

impl Validate for LoginRequest {
    const RULES: &'static [FieldRules] = &[
        field("email", &[Rule::Required, len(1, 254)]),
        field("password", &[Rule::Required, len(1, 72)]),
    ];
}

const EVENT_CONFIG_RULES: &[FieldRules] = &[
    field("name", &[Rule::Required, len(1, 200)]),
    field("description", &[len(0, 2000)]),
    field("start_date", &[Rule::Required]),
    field("end_date", &[Rule::Required]),
    field("location", &[Rule::Required, len(1, 500)]),
    field("cover_photo", &[Rule::Url]),
];

fn check_event_dates(config: &EventConfig, errors: &mut ValidationErrors) {
    if config.end_date <= config.start_date {
        errors.push("end_date", "must be after start_date");
    }
}

impl Validate for EventConfig {
    const RULES: &'static [FieldRules] = EVENT_CONFIG_RULES;

    fn check_relations(&self, errors: &mut ValidationErrors) {
        check_event_dates(self, errors);
    }
}

impl Validate for EventCreate {
    // `config` is flattened, so its fields sit at the top level.
    const RULES: &'static [FieldRules] = EVENT_CONFIG_RULES;

    fn check_relations(&self, errors: &mut ValidationErrors) {
        check_event_dates(&self.config, errors);
    }
}

impl Validate for EventUpdate {
    const RULES: &'static [FieldRules] = &[
        field("name", &[len(1, 200)]),
        field("description", &[len(0, 2000)]),
        field("location", &[len(1, 500)]),
        field("cover_photo", &[Rule::Url]),
    ];

    fn check_relations(&self, errors: &mut ValidationErrors) {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end <= start {
                errors.push("end_date", "must be after start_date");
            }
        }
    }
}

impl Validate for GroupCreate {
    const RULES: &'static [FieldRules] = &[
        field("name", &[Rule::Required, len(1, 200)]),
        field("description", &[len(0, 2000)]),
        field("icon", &[Rule::Url]),
        field("cover_photo", &[Rule::Url]),
    ];
}

impl Validate for GroupUpdate {
    const RULES: &'static [FieldRules] = &[
        field("name", &[len(1, 200)]),
        field("description", &[len(0, 2000)]),
        field("icon", &[Rule::Url]),
        field("cover_photo", &[Rule::Url]),
    ];
}

impl Validate for DiscussionCreate {
    const RULES: &'static [FieldRules] = &[
        field("title", &[Rule::Required, len(1, 200)]),
        field("description", &[len(0, 1000)]),
        field("linked_id", REQUIRED_ID),
    ];
}

impl Validate for MessageCreate {
    const RULES: &'static [FieldRules] = &[
        field("content", &[Rule::Required, len(1, 5000)]),
        field("parent_message_id", &[len(1, 128)]),
    ];
}

impl Validate for AlbumCreate {
    const RULES: &'static [FieldRules] = &[
        field("event_id", REQUIRED_ID),
        field("name", &[Rule::Required, len(1, 200)]),
        field("description", &[len(0, 1000)]),
    ];
}

impl Validate for PhotoCreate {
    const RULES: &'static [FieldRules] = &[
        field("album_id", REQUIRED_ID),
        field("image_url", &[Rule::Required, Rule::Url]),
        field("caption", &[len(0, 500)]),
    ];
}

impl Validate for CommentCreate {
    const RULES: &'static [FieldRules] = &[field("content", &[Rule::Required, len(1, 1000)])];
}

impl Validate for PollCreate {
    const RULES: &'static [FieldRules] = &[
        field("event_id", REQUIRED_ID),
        field("title", &[Rule::Required, len(1, 200)]),
        field("description", &[len(0, 1000)]),
        field("questions", &[Rule::Required, Rule::MinItems(1)]),
        field("questions[].text", &[Rule::Required, len(1, 500)]),
        field("questions[].answers", &[Rule::Required, Rule::MinItems(2)]),
        field("questions[].answers[]", &[len(1, 200)]),
    ];

    fn check_relations(&self, errors: &mut ValidationErrors) {
        for (index, question) in self.questions.iter().enumerate() {
            let mut seen = HashSet::new();
            if !question.answers.iter().all(|answer| seen.insert(answer.as_str())) {
                errors.push(format!("questions[{index}].answers"), "answers must be unique");
            }
        }
    }
}

impl Validate for VoteCreate {
    const RULES: &'static [FieldRules] = &[
        field("poll_id", REQUIRED_ID),
        field("question_id", REQUIRED_ID),
        field("answer", &[Rule::Required, len(1, 200)]),
    ];
}

impl Validate for TicketTypeCreate {
    const RULES: &'static [FieldRules] = &[
        field("event_id", REQUIRED_ID),
        field("name", &[Rule::Required, len(1, 100)]),
        field("description", &[len(0, 500)]),
        field("price", &[Rule::Required, Rule::Min(0.0)]),
        field("quantity", &[Rule::Required, Rule::Positive]),
        field("max_per_person", &[Rule::Min(1.0)]),
    ];
}

impl Validate for TicketPurchase {
    const RULES: &'static [FieldRules] = &[
        field("ticket_type_id", REQUIRED_ID),
        field("buyer_info.first_name", &[Rule::Required, len(1, 100)]),
        field("buyer_info.last_name", &[Rule::Required, len(1, 100)]),
        field("buyer_info.email", &[Rule::Required, Rule::Email]),
        field("buyer_info.address", &[len(0, 500)]),
        field("buyer_info.phone", &[len(0, 20)]),
    ];
}

impl Validate for ShoppingItemCreate {
    const RULES: &'static [FieldRules] = &[
        field("event_id", REQUIRED_ID),
        field("name", &[Rule::Required, len(1, 200)]),
        field("quantity", &[Rule::Required, Rule::Positive]),
        field("unit", &[len(0, 50)]),
        field("notes", &[len(0, 500)]),
    ];
}

impl Validate for ShoppingItemUpdate {
    const RULES: &'static [FieldRules] = &[
        field("name", &[len(1, 200)]),
        field("quantity", &[Rule::Positive]),
        field("unit", &[len(0, 50)]),
        field("notes", &[len(0, 500)]),
    ];
}
