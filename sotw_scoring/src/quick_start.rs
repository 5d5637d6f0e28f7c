/*!

# Quick start with Google Forms

This example runs one week of the contest end to end. The songs come from a shared
playlist and the votes are collected with Google Forms.

**Collecting the songs** Every participant adds one song to the shared playlist during the week.
Export the playlist to JSON (the format returned by the playlist API, with the `items`
array, `added_at`, `added_by` and `track` fields) and save it next to the configuration
file, for example as `playlist.json`.

**Creating the ballot** Create a new Form and add one **Multiple Choice Grid** question.
The rows are the songs, written as `"Title" - Artists`, the columns are the places:
`First Place`, `Second Place`, `Third Place`. Enable "Limit to one response per column"
so that every voter gives each place once.

The name of the question does not matter. Google Forms exports each row of the grid as a column
named after the question, followed by the song between brackets:

```text
Which songs did you like this week? (pick 3) ["Alpha" - Band A]
```

**Getting the results** In the `Responses` tab, use the `Link to Sheets` option and download
the spreadsheet in the **Excel format** (xlsx).

**Configuration** Describe the round in a JSON file:

```json
{
  "roundSettings": { "contestName": "Song of the Week", "roundDate": "2022-08-12" },
  "submissionSource": { "provider": "playlist_json", "filePath": "playlist.json", "songCount": 9 },
  "ballotSource": { "provider": "google_forms", "filePath": "{date} responses.xlsx" },
  "participants": [
    { "name": "Ann", "usernames": ["ann_1987"], "ledgerColumn": "H" },
    { "name": "Ben", "usernames": ["bbb"], "ledgerColumn": "I" }
  ],
  "rules": { "tiebreakMode": "weightedRandom", "houseCandidate": "House" },
  "ledger": { "directory": "ledger", "lastRow": 203 }
}
```

`{date}` is replaced by the date of the round (`2022.08.12`).

**Checking the names** The song names in the playlist and in the form are typed by different
people and do not always match. Run the check first:

```bash
sotw --config round.json --check
```

Fix the song names (or add a `songTitle` for the participant) until the check reports no
mismatch.

**Scoring** Run the round:

```bash
sotw --config round.json --out summary.json
```

```text
[2022-08-12T19:55:59Z INFO  sotw_scoring] score_round: scoring 9 submissions with 8 ballots
[2022-08-12T19:55:59Z INFO  sotw_scoring] resolve_round: max points: 11 winner count: 1
[2022-08-12T19:55:59Z INFO  sotw_scoring] resolve_round: winner: Ann song: Alpha - Band A
```

The results are added to the ledger on row `lastRow + 1`. Remember to increment `lastRow`
in the configuration before the next round.

*/
