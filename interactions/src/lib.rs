/*!
# Cobuy Interactions

The collaborative half of the recommender: turns a raw interaction log into
co-occurrence counts and lift scores.

## Pipeline

```text
InteractionLog (user, product, event, timestamp)
  └─> group by user, dedupe products
        └─> CoOccurrenceTable  (distinct users per product pair)
              └─> LiftTable    P(a,b) / (P(a)·P(b)) over distinct users
```

Both tables are rebuilt from scratch on every run; there is no incremental
update path. Event type does not affect counting: one credit per user per
product pair, however often the pair was touched.

## Example

```rust,no_run
use cobuy_interactions::{CoOccurrenceTable, InteractionLog, LiftTable};
use std::path::Path;

fn main() -> cobuy_interactions::Result<()> {
    let log = InteractionLog::load(Path::new("data/interactions.json"))?;
    let co_occurrence = CoOccurrenceTable::build(&log);
    let lift = LiftTable::compute(&co_occurrence, &log);

    for (candidate, score) in lift.top_candidates("gid://shop/Product/1", 5) {
        println!("{candidate}: {score:.2}");
    }
    Ok(())
}
```
*/

mod cooccurrence;
mod error;
mod event;
mod lift;

pub use cooccurrence::CoOccurrenceTable;
pub use error::{InteractionError, Result};
pub use event::{EventType, InteractionEvent, InteractionLog};
pub use lift::LiftTable;
