//! Port capability listing.

use clap::{Args, ValueEnum};
use floatmix_core::{
    AudioFormat, AudioInfo, AudioLayout, Direction, FloatMix, NodeError, ParamObject, ParamType,
    Value,
};
use serde_json::json;

/// Which port to query.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum PortSide {
    /// Input port 0
    Input,
    /// The output port
    #[default]
    Output,
}

impl From<PortSide> for Direction {
    fn from(side: PortSide) -> Self {
        match side {
            PortSide::Input => Direction::Input,
            PortSide::Output => Direction::Output,
        }
    }
}

/// Show the parameters a port advertises.
#[derive(Args)]
pub struct CapsArgs {
    /// Port to query
    #[arg(long, value_enum, default_value_t = PortSide::Output)]
    port: PortSide,

    /// Negotiate this rate first; enumerated formats are filtered by it
    #[arg(long)]
    rate: Option<u32>,

    /// Channels to negotiate with --rate
    #[arg(long, default_value_t = 1)]
    channels: u32,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Run the caps command.
pub fn run(args: CapsArgs) -> anyhow::Result<()> {
    let direction = Direction::from(args.port);
    let mut node = FloatMix::new();
    if direction == Direction::Input {
        node.add_port(direction, 0)?;
    }

    let wanted = args.rate.map(|rate| {
        AudioInfo::new(
            AudioFormat::F32,
            AudioLayout::NonInterleaved,
            rate,
            args.channels,
        )
        .to_object(ParamType::EnumFormat)
    });
    let enum_formats: Vec<ParamObject> = node
        .port_params(direction, 0, ParamType::EnumFormat, wanted.as_ref())
        .collect::<Result<_, _>>()?;

    if let Some(rate) = args.rate {
        let format = AudioInfo::new(
            AudioFormat::F32,
            AudioLayout::NonInterleaved,
            rate,
            args.channels,
        );
        node.port_set_format(direction, 0, Some(&format.to_format()))?;
    }

    let mut sections = Vec::new();
    for id in std::iter::once(ParamType::List).chain(ParamType::PORT_PARAMS) {
        let objects = if id == ParamType::EnumFormat {
            Ok(enum_formats.clone())
        } else {
            node.port_params(direction, 0, id, None)
                .collect::<Result<Vec<_>, _>>()
        };
        sections.push((id, objects));
    }

    if args.json {
        let params: Vec<_> = sections
            .iter()
            .map(|(id, objects)| match objects {
                Ok(objects) => json!({
                    "param": id.name(),
                    "objects": objects.iter().map(object_json).collect::<Vec<_>>(),
                }),
                Err(e) => json!({
                    "param": id.name(),
                    "error": e.to_string(),
                    "errno": e.errno(),
                }),
            })
            .collect();
        let report = json!({
            "port": direction.to_string(),
            "negotiated": args.rate.is_some(),
            "params": params,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{direction} port 0");
    for (id, objects) in &sections {
        println!("\n{}:", id.name());
        match objects {
            Ok(objects) if objects.is_empty() => println!("  (none)"),
            Ok(objects) => {
                for object in objects {
                    println!("  {object}");
                }
            }
            Err(NodeError::NoFormat { .. }) => println!("  (needs a negotiated format)"),
            Err(e) => println!("  error: {e}"),
        }
    }

    Ok(())
}

fn object_json(object: &ParamObject) -> serde_json::Value {
    let props: serde_json::Map<String, serde_json::Value> = object
        .properties()
        .iter()
        .map(|p| (p.key.name().to_string(), value_json(p.value)))
        .collect();
    json!({
        "type": object.object_type().name(),
        "props": props,
    })
}

fn value_json(value: Value) -> serde_json::Value {
    match value {
        Value::Id(id) => json!({ "id": id }),
        Value::Int(v) => json!(v),
        Value::Range { default, min, max } => json!({
            "default": default,
            "min": min,
            "max": max,
        }),
    }
}
