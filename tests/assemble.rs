use std::rc::Rc;

use octasm::{
    Assembler,
    analyze::lex::Lexer,
    synthesize::{
        isa::{AddressingMode, Mnemonic},
        output::DummyOutput,
    },
};
use strum::IntoEnumIterator;

fn source_name() -> Rc<String> {
    Rc::new(String::from("main.asm"))
}

fn assembles(source: &str) -> Vec<u8> {
    let assembler: Assembler<DummyOutput> = Assembler::default();
    assembler
        .assemble_source(source_name(), source)
        .unwrap()
        .bytes
}

fn fails(source: &str) {
    let assembler: Assembler<DummyOutput> = Assembler::default();
    assert!(assembler.assemble_source(source_name(), source).is_err());
}

#[test]
fn mov_register_immediate() {
    assert_eq!(assembles("MOV A, 5"), vec![0x01, 0x03, 0x00, 0x05]);
}

#[test]
fn add_register_register() {
    assert_eq!(assembles("ADD A, B"), vec![0x02, 0x04, 0x00, 0x01]);
}

#[test]
fn hex_and_decimal_literals_encode_identically() {
    assert_eq!(assembles("MOV A, 0x1F"), assembles("MOV A, 31"));
    assert_eq!(assembles("MOV A, 0x1F")[3], 31);
}

#[test]
fn zero_operand_instruction_before_another_mnemonic() {
    assert_eq!(
        assembles("ADD\nMOV A, 5"),
        vec![0x02, 0x00, 0x01, 0x03, 0x00, 0x05]
    );
}

#[test]
fn memory_reference_forms() {
    assert_eq!(assembles("MOV [C+2], 9"), vec![0x01, 0x05, 0x02, 0x02, 0x09]);
    assert_eq!(assembles("MOV [C+2], D"), vec![0x01, 0x06, 0x02, 0x02, 0x03]);
    assert_eq!(assembles("ADD A, [B+4]"), vec![0x02, 0x07, 0x00, 0x01, 0x04]);
}

#[test]
fn records_concatenate_in_source_order() {
    assert_eq!(
        assembles("MOV A, 5\nADD A, B"),
        vec![0x01, 0x03, 0x00, 0x05, 0x02, 0x04, 0x00, 0x01]
    );
}

#[test]
fn immediates_wrap_to_the_word_size() {
    assert_eq!(assembles("MOV A, 300"), vec![0x01, 0x03, 0x00, 44]);
}

#[test]
fn empty_source_assembles_to_an_empty_image() {
    assert_eq!(assembles(""), Vec::<u8>::new());
}

/// Every mode a mnemonic whitelists must be reachable from source text, and
/// the emitted record must carry that mode's tag and operand count.
#[test]
fn every_whitelisted_mode_is_reachable() {
    fn sample_operands(mode: AddressingMode) -> &'static str {
        match mode {
            AddressingMode::NoOperand => "",
            AddressingMode::Immediate => " 5",
            AddressingMode::Register => " B",
            AddressingMode::RegImm => " A, 5",
            AddressingMode::RegReg => " A, B",
            AddressingMode::MemImm => " [A+1], 5",
            AddressingMode::MemReg => " [A+1], B",
            AddressingMode::RegMem => " A, [B+1]",
        }
    }

    for mnemonic in Mnemonic::iter() {
        for mode in AddressingMode::iter() {
            if !mnemonic.allowed_modes().contains(mode.flag()) {
                continue;
            }

            let source = format!("{}{}", mnemonic.name(), sample_operands(mode));
            let bytes = assembles(&source);
            assert_eq!(bytes[0], mnemonic.opcode(), "opcode for '{}'", source);
            assert_eq!(bytes[1], mode.tag(), "mode tag for '{}'", source);
            assert_eq!(
                bytes.len(),
                2 + mode.operand_count(),
                "record length for '{}'",
                source
            );
        }
    }
}

#[test]
fn rejects_unknown_mnemonics() {
    fails("FOO A, 5");
    fails("mov A, 5");
}

#[test]
fn rejects_unknown_registers_in_every_operand_position() {
    fails("MOV Z, 5");
    fails("ADD A, Z");
    fails("MOV A, [Q+1]");
    fails("MOV [Q+1], 5");
}

#[test]
fn rejects_modes_outside_the_whitelist() {
    fails("ADD [A+1], 5");
    fails("MOV 5");
    fails("MOV B");
}

#[test]
fn rejects_malformed_memory_references() {
    fails("MOV A, [B 4]");
    fails("MOV A, [B+4");
    fails("MOV [B+4] 5");
}

#[test]
fn rejects_truncated_instructions() {
    fails("MOV A,");
    fails("MOV A, [");
}

#[test]
fn rejects_lexical_garbage() {
    fails("MOV A, 0x");
    fails("MOV \u{e9}, 5");
}

#[test]
fn rejects_an_operand_where_a_mnemonic_is_expected() {
    fails(", MOV A, 5");
    fails("5 MOV A, 5");
}

/// Rendering each token back to its canonical text and re-tokenizing yields
/// the same token kinds.
#[test]
fn token_rendering_round_trips() {
    let source = "MOV A, 0x1F ADD _tmp, [B-4]";
    let stream = Lexer::tokenize(source_name(), source).unwrap();

    let rendered = stream
        .tokens()
        .iter()
        .map(|t| t.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let relexed = Lexer::tokenize(source_name(), &rendered).unwrap();

    let kinds = |s: &octasm::analyze::lex::TokenStream| {
        s.tokens().iter().map(|t| t.kind.clone()).collect::<Vec<_>>()
    };
    assert_eq!(kinds(&stream), kinds(&relexed));
}
