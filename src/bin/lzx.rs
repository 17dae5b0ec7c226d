use clap::{arg,crate_version,Arg,Command};
use nitrolz::lzx;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();

    let long_help =
"Examples:
---------
Encode LZ11:   `lzx -ewb my_raw my_packed`
Encode LZ40:   `lzx -ewl my_raw my_packed`
Decode either: `lzx -d my_packed my_raw`";

    let commands = ["-d","-evb","-ewb","-evl","-ewl"];

    let matches = Command::new("lzx")
        .about("LZ11/LZ40 extended coding for GBA/DS content")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(<command> "what to do: -d decodes either format; -e{v|w}{b|l} encodes VRAM or WRAM safe, with big (LZ11) or low (LZ40) endian lengths")
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
            let (raw,warnings) = lzx::decode(&pak);
            for warning in warnings {
                eprintln!("warning: {}",warning);
            }
            std::fs::write(path_out,raw)?;
        } else {
            log::info!("encoding '{}' -> '{}'",path_in,path_out);
            let vram_safe = command.starts_with("-ev");
            let raw = std::fs::read(path_in)?;
            let pak = match command.ends_with('b') {
                true => lzx::encode_lz11(&raw,vram_safe)?,
                false => lzx::encode_lz40(&raw,vram_safe)?
            };
            std::fs::write(path_out,pak)?;
        }
    }

    Ok(())
}
