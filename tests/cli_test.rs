use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn test_data() -> Vec<u8> {
    "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(10).into_bytes()
}

fn round_trip(bin: &str, encode_command: &str) -> STDRESULT {
    let data = test_data();
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    let pak_path = temp_dir.path().join("packed.bin");
    let out_path = temp_dir.path().join("expanded.bin");
    std::fs::write(&raw_path,&data)?;
    Command::cargo_bin(bin)?
        .arg(encode_command)
        .arg(&raw_path)
        .arg(&pak_path)
        .assert()
        .success();
    Command::cargo_bin(bin)?
        .arg("-d")
        .arg(&pak_path)
        .arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out_path)?,data);
    Ok(())
}

#[test]
fn lz10_normal_round_trip() -> STDRESULT {
    round_trip("lz10","-ewn")?;
    round_trip("lz10","-evn")
}

#[test]
fn lz10_fast_round_trip() -> STDRESULT {
    round_trip("lz10","-ewf")?;
    round_trip("lz10","-evf")
}

#[test]
fn lz10_optimal_round_trip() -> STDRESULT {
    round_trip("lz10","-ewo")?;
    round_trip("lz10","-evo")
}

#[test]
fn lz11_round_trip() -> STDRESULT {
    round_trip("lzx","-ewb")?;
    round_trip("lzx","-evb")
}

#[test]
fn lz40_round_trip() -> STDRESULT {
    round_trip("lzx","-ewl")?;
    round_trip("lzx","-evl")
}

#[test]
fn multiple_file_pairs() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data_1 = test_data();
    let data_2 = vec![0u8;500];
    let raw_1 = temp_dir.path().join("raw_1.bin");
    let raw_2 = temp_dir.path().join("raw_2.bin");
    let pak_1 = temp_dir.path().join("pak_1.bin");
    let pak_2 = temp_dir.path().join("pak_2.bin");
    let out_1 = temp_dir.path().join("out_1.bin");
    let out_2 = temp_dir.path().join("out_2.bin");
    std::fs::write(&raw_1,&data_1)?;
    std::fs::write(&raw_2,&data_2)?;
    Command::cargo_bin("lz10")?
        .arg("-ewf")
        .arg(&raw_1).arg(&pak_1)
        .arg(&raw_2).arg(&pak_2)
        .assert()
        .success();
    Command::cargo_bin("lz10")?
        .arg("-d")
        .arg(&pak_1).arg(&out_1)
        .arg(&pak_2).arg(&out_2)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out_1)?,data_1);
    assert_eq!(std::fs::read(&out_2)?,data_2);
    Ok(())
}

#[test]
fn decode_warns_on_foreign_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("not_packed.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::write(&in_path,b"plainly not packed")?;
    Command::cargo_bin("lz10")?
        .arg("-d")
        .arg(&in_path)
        .arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("not an LZ packed stream"));
    assert_eq!(std::fs::read(&out_path)?.len(),0);
    Ok(())
}

#[test]
fn odd_file_arguments_fail() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let raw_path = temp_dir.path().join("raw.bin");
    std::fs::write(&raw_path,b"abc")?;
    Command::cargo_bin("lz10")?
        .arg("-ewn")
        .arg(&raw_path)
        .arg(temp_dir.path().join("a.bin"))
        .arg(temp_dir.path().join("b.bin"))
        .assert()
        .failure();
    Ok(())
}
