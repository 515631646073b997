use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NoteType {
    Daily,
    Project,
    Meeting,
    Design,
    Learning,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoteType::Daily => "daily",
            NoteType::Project => "project",
            NoteType::Meeting => "meeting",
            NoteType::Design => "design",
            NoteType::Learning => "learning",
        })
    }
}

impl NoteType {
    /// Directory the type's notes live in, relative to the notes root.
    pub fn directory(&self) -> &'static str {
        match self {
            NoteType::Daily => "daily",
            NoteType::Project => "projects",
            NoteType::Meeting => "meetings",
            NoteType::Design => "design",
            NoteType::Learning => "learning",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            NoteType::Daily => DAILY,
            NoteType::Project => PROJECT,
            NoteType::Meeting => MEETING,
            NoteType::Design => DESIGN,
            NoteType::Learning => LEARNING,
        }
    }
}

/// Fills in a note skeleton for the given type.
pub fn render(note_type: NoteType, title: &str, date: NaiveDate) -> String {
    note_type
        .template()
        .replace("{title}", title)
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
}

const DAILY: &str = "\
# {date}

## Tasks
- [ ] 

## Notes


## Follow-ups

";

const PROJECT: &str = "\
# {title}

## Overview


## Goals


## Status


## Actions
- [ ] 

## Notes


## Decisions


## Risks
";

const MEETING: &str = "\
# {title}

**Date:** {date}
**Attendees:**

## Agenda


## Discussion


## Decisions


## Action Items
- [ ] 

## Follow-up";

const DESIGN: &str = "\
# {title}

## Problem Statement


## Solution Overview


## Options Considered

### Option A:

#### Summary

#### Pros
-

#### Cons
-

## Recommended Approach


## Implementation Plan


## Risks & Mitigations";

const LEARNING: &str = "\
# {title}

**Date:** {date}
**Source:**

## Key Concepts


## Summary


## Examples


## Code/Commands
```

```

## Notes & Insights


## Action Items
- [ ] 

## Related Topics
-

## References
- ";
