use crate::error::{Result, SettlementError};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

/// One instruction of a settlement script.
///
/// Orders are referenced by their creation ordinal (1-based) since external
/// ids are random and unknowable when the script is written.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// `stock,<seller>,<sku>,<title>,<color>,<size>,<quantity>,<price>`
    Stock {
        seller: String,
        sku: String,
        title: String,
        color: String,
        size: String,
        quantity: u32,
        price: Decimal,
    },
    /// `address,<buyer>,<line>,<city>`
    Address {
        buyer: String,
        line: String,
        city: String,
    },
    /// `cart,<buyer>,<sku>,<quantity>`
    CartAdd {
        buyer: String,
        sku: String,
        quantity: u32,
    },
    /// `checkout,<buyer>`
    Checkout { buyer: String },
    /// `status,<actor>,<order-ordinal>,<STATUS>`
    Status {
        actor: String,
        order: usize,
        status: String,
    },
    /// `cancel,<buyer>,<order-ordinal>`
    Cancel { buyer: String, order: usize },
    /// `delete,<actor>,<order-ordinal>`
    Delete { actor: String, order: usize },
}

/// Streaming reader for settlement scripts.
///
/// Headerless CSV; `#`-prefixed lines are comments, whitespace is trimmed,
/// record lengths are flexible (each command has its own arity).
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader.into_records().map(|record| {
            let record = record?;
            parse_record(&record)
        })
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: usize) -> Result<&'a str> {
    record.get(index).ok_or_else(|| {
        SettlementError::InvalidInput(format!("missing field {index} in: {record:?}"))
    })
}

fn numeric<T: FromStr>(record: &csv::StringRecord, index: usize) -> Result<T> {
    let raw = field(record, index)?;
    raw.parse().map_err(|_| {
        SettlementError::InvalidInput(format!("field {index} is not a number: {raw}"))
    })
}

fn parse_record(record: &csv::StringRecord) -> Result<ScriptCommand> {
    match field(record, 0)? {
        "stock" => Ok(ScriptCommand::Stock {
            seller: field(record, 1)?.to_string(),
            sku: field(record, 2)?.to_string(),
            title: field(record, 3)?.to_string(),
            color: field(record, 4)?.to_string(),
            size: field(record, 5)?.to_string(),
            quantity: numeric(record, 6)?,
            price: numeric(record, 7)?,
        }),
        "address" => Ok(ScriptCommand::Address {
            buyer: field(record, 1)?.to_string(),
            line: field(record, 2)?.to_string(),
            city: field(record, 3)?.to_string(),
        }),
        "cart" => Ok(ScriptCommand::CartAdd {
            buyer: field(record, 1)?.to_string(),
            sku: field(record, 2)?.to_string(),
            quantity: numeric(record, 3)?,
        }),
        "checkout" => Ok(ScriptCommand::Checkout {
            buyer: field(record, 1)?.to_string(),
        }),
        "status" => Ok(ScriptCommand::Status {
            actor: field(record, 1)?.to_string(),
            order: numeric(record, 2)?,
            status: field(record, 3)?.to_string(),
        }),
        "cancel" => Ok(ScriptCommand::Cancel {
            buyer: field(record, 1)?.to_string(),
            order: numeric(record, 2)?,
        }),
        "delete" => Ok(ScriptCommand::Delete {
            actor: field(record, 1)?.to_string(),
            order: numeric(record, 2)?,
        }),
        other => Err(SettlementError::InvalidInput(format!(
            "unknown command: {other}"
        ))),
    }
}
