/*!

This is the long-form manual for `sotw_scoring` and `sotw`.

## Scoring

Each voter gives a `First Place`, a `Second Place` and a `Third Place` to the songs of the
round. A first place is worth 3 points, a second place 2 points and a third place 1 point.
The score of a participant is the sum over all the ballots of the points given to the song
of this participant.

The labels of the places can be changed with the `rankLabels` option.

## Tiebreak

When several participants share the highest score, the winner is drawn at random.
The tied participants share a pool of 999 weight units equally. A house candidate may be
added to the draw with a weight of 1: it keeps a small chance of the draw not
going to any of the tied participants. When the house candidate is drawn, the round has no
winner and nothing is written to the ledger; rerun with another seed.

The draw is reproducible. The seed is taken from the `randomSeed` option, or from the
`--seed` flag, or derived from the date of the round.

The `useSubmissionOrder` mode gives the win to the first tied participant instead.

## Input formats

Submissions:
* `playlist_json` a playlist export (JSON)
* `csv` a CSV file with the columns `title`, `artists`, `submitter`

Ballots:
* `google_forms` an Excel export of a Google Forms multiple choice grid
* `csv` a CSV file with a `voter` column and one column per song

### `playlist_json`

The tracks are sorted by date of addition, newest first. The songs listed in `excluded` are
dropped, then `songCount` tracks are kept, starting at `offset` (0 is the most recent track).
The user ids of the playlist are mapped to participants with the `usernames` option.

### `google_forms`

The header of every grid column ends with the song between brackets:
`Question (pick 3) ["Alpha" - Band A]`. The voter is identified by the `voterColumn` column
if provided, or by the position of the row otherwise.

### `csv`

```text
voter,"""Alpha"" - Band A","""Bravo"" - Band B"
v1,First Place,Second Place
v2,,First Place
```

## Ledger

The ledger is a directory with three tables, stored in CSV and addressed like a spreadsheet
(`A1` is the top-left cell):

* `points_calculation.csv`: the scoring table of the last round, cleared and rewritten
  every round (rows 2 to 12 by default).
* `all_time_results.csv`: one row per round with the date, the winner, the winning song
  and the points of every participant in their `ledgerColumn`.
* `available_total_points.csv`: one row per round. The cells of the previous row are carried
  forward with their cell references moved down one row.

The new rows are written at `lastRow + 1`. `lastRow` must be incremented by hand in the
configuration after every round.

*/
