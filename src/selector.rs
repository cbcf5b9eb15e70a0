use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PickerError;
use crate::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub winner: String,
    pub index: usize,
    pub rounds: usize,
}

pub fn pick<R: Rng>(
    mode: Mode,
    options: &[String],
    rng: &mut R,
) -> Result<Pick, PickerError> {
    match mode {
        Mode::Simple => pick_simple(options, rng),
        Mode::Multiple => pick_multiple(options, rng),
    }
}

pub fn pick_simple<R: Rng>(options: &[String], rng: &mut R) -> Result<Pick, PickerError> {
    if options.is_empty() {
        return Err(PickerError::EmptyList);
    }
    let index = rng.gen_range(0..options.len());
    Ok(Pick {
        winner: options[index].clone(),
        index,
        rounds: 0,
    })
}

// When n is not a power of two the bye slot has better odds than a paired
// slot. The shuffle decides who lands there, so each option still wins 1/n.
pub fn pick_multiple<R: Rng>(
    options: &[String],
    rng: &mut R,
) -> Result<Pick, PickerError> {
    if options.is_empty() {
        return Err(PickerError::EmptyList);
    }

    let mut round: Vec<usize> = (0..options.len()).collect();
    round.shuffle(rng);

    let mut rounds = 0;
    while round.len() > 1 {
        round = play_round(&round, rng);
        rounds += 1;
    }

    let index = round[0];
    Ok(Pick {
        winner: options[index].clone(),
        index,
        rounds,
    })
}

pub fn play_round<T: Copy, R: Rng>(entrants: &[T], rng: &mut R) -> Vec<T> {
    entrants
        .chunks(2)
        .map(|pair| match *pair {
            [left, right] => {
                if rng.gen_bool(0.5) {
                    left
                } else {
                    right
                }
            }
            [bye] => bye,
            _ => unreachable!("chunks(2) yields one or two entrants"),
        })
        .collect()
}

pub fn bracket_rounds(entrants: usize) -> usize {
    if entrants <= 1 {
        0
    } else {
        entrants.next_power_of_two().trailing_zeros() as usize
    }
}
