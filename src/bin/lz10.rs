use clap::{arg,crate_version,Arg,Command};
use nitrolz::{lz10,Strategy};

const RCH: &str = "unreachable was reached";

fn strategy_for(command: &str) -> Option<Strategy> {
    match command.chars().last() {
        Some('n') => Some(Strategy::Greedy),
        Some('f') => Some(Strategy::Fast),
        Some('o') => Some(Strategy::Lazy),
        _ => None
    }
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();

    let long_help =
"Examples:
---------
Encode:        `lz10 -ewn my_raw my_packed`
Encode 2 VRAM: `lz10 -evo raw_1 packed_1 raw_2 packed_2`
Decode:        `lz10 -d my_packed my_raw`";

    let commands = ["-d","-evn","-ewn","-evf","-ewf","-evo","-ewo"];

    let matches = Command::new("lz10")
        .about("LZ10 coding for GBA/DS content")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(<command> "what to do: -d decodes; -e{v|w}{n|f|o} encodes VRAM or WRAM safe, in normal, fast, or optimal mode")
            .value_parser(commands)
            .allow_hyphen_values(true))
        .arg(Arg::new("files")
            .help("input output path pairs")
            .num_args(2..)
            .required(true))
        .get_matches();

    let command = matches.get_one::<String>("command").expect(RCH);
    let files: Vec<&String> = matches.get_many::<String>("files").expect(RCH).collect();
    if files.len() % 2 != 0 {
        eprintln!("no output file name provided");
        return Err(Box::new(std::fmt::Error));
    }

    for pair in files.chunks(2) {
        let (path_in,path_out) = (pair[0],pair[1]);
        if command == "-d" {
            log::info!("decoding '{}' -> '{}'",path_in,path_out);
            let pak = std::fs::read(path_in)?;
            let (raw,warnings) = lz10::decode(&pak);
            for warning in warnings {
                eprintln!("warning: {}",warning);
            }
            std::fs::write(path_out,raw)?;
        } else {
            log::info!("encoding '{}' -> '{}'",path_in,path_out);
            let vram_safe = command.starts_with("-ev");
            let strategy = strategy_for(command).expect(RCH);
            let raw = std::fs::read(path_in)?;
            let pak = lz10::encode(&raw,strategy,vram_safe)?;
            std::fs::write(path_out,pak)?;
        }
    }

    Ok(())
}
